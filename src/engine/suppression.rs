use std::collections::HashSet;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::EngineError;

/// Advisory ids suppressed by a suppression file.
///
/// The file uses the DependencyCheck layout; only `<cve>` and
/// `<vulnerabilityName>` entries inside `<suppress>` blocks are honoured:
///
/// ```xml
/// <suppressions>
///   <suppress>
///     <notes>false positive</notes>
///     <cve>CVE-2015-7501</cve>
///   </suppress>
/// </suppressions>
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Suppressions {
    ids: HashSet<String>,
}

impl Suppressions {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::parse(&content).map_err(|reason| {
            EngineError::Message(format!("suppression file {}: {reason}", path.display()))
        })
    }

    pub fn parse(xml: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut ids = HashSet::new();
        let mut buf = Vec::new();
        let mut in_suppress = false;
        let mut current_tag = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                    if name == "suppress" {
                        in_suppress = true;
                    }
                    current_tag = name;
                }
                Ok(Event::End(ref e)) => {
                    if e.name().local_name().as_ref() == b"suppress" {
                        in_suppress = false;
                    }
                    current_tag.clear();
                }
                Ok(Event::Text(ref e)) if in_suppress => {
                    if matches!(current_tag.as_str(), "cve" | "vulnerabilityName") {
                        let text = e.unescape().map_err(|e| e.to_string())?;
                        let id = text.trim();
                        if !id.is_empty() {
                            ids.insert(id.to_owned());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!(
                        "malformed xml at position {}: {e}",
                        reader.buffer_position()
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { ids })
    }

    pub fn is_suppressed(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
