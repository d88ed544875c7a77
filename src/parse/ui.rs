use regex::Regex;

use super::tagged::extract_family_ids;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiStructure {
    pub screens: Vec<UiScreen>,
    pub flows: Vec<UiFlow>,
    pub refs: Vec<UiReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiScreen {
    pub name: String,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiFlow {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiReference {
    pub id: String,
    pub path: String,
    pub ac_ids: Vec<String>,
}

/// Extracts screens, flows and UI references from a UI section body. The
/// three extractions are independent; a malformed line drops only itself.
pub fn extract_ui_structure(body: &str) -> UiStructure {
    let component_pattern = Regex::new(r"\[(?P<name>[^\[\]]+)\]").expect("component pattern");
    let flow_pattern = Regex::new(r"^\s*Flow:\s*(?P<from>.+?)\s*(?:→|->)\s*(?P<to>.+?)\s*$")
        .expect("flow pattern");
    let ref_pattern = Regex::new(
        r"^\s*-\s*(?P<id>UI-REF-\d+)\s*:\s*(?P<path>.+?)\s*(?:→|->)\s*(?P<acs>.+?)\s*$",
    )
    .expect("ui ref pattern");

    let mut structure = UiStructure::default();
    let mut active_screen: Option<UiScreen> = None;

    for line in body.lines() {
        let trimmed = line.trim();

        if let Some(name) = trimmed.strip_prefix("Screen:") {
            if let Some(screen) = active_screen.take() {
                structure.screens.push(screen);
            }
            active_screen = Some(UiScreen {
                name: name.trim().to_string(),
                components: Vec::new(),
            });
            continue;
        }

        if let Some(captures) = flow_pattern.captures(trimmed) {
            if let Some(screen) = active_screen.take() {
                structure.screens.push(screen);
            }
            structure.flows.push(UiFlow {
                from: captures["from"].to_string(),
                to: captures["to"].to_string(),
            });
            continue;
        }

        if let Some(captures) = ref_pattern.captures(trimmed) {
            if let Some(screen) = active_screen.take() {
                structure.screens.push(screen);
            }
            structure.refs.push(UiReference {
                id: captures["id"].to_string(),
                path: captures["path"].to_string(),
                ac_ids: extract_family_ids(&captures["acs"], "AC"),
            });
            continue;
        }

        if trimmed.starts_with('#') {
            if let Some(screen) = active_screen.take() {
                structure.screens.push(screen);
            }
            continue;
        }

        if let Some(screen) = active_screen.as_mut() {
            for captures in component_pattern.captures_iter(trimmed) {
                screen.components.push(captures["name"].trim().to_string());
            }
        }
    }

    if let Some(screen) = active_screen.take() {
        structure.screens.push(screen);
    }

    structure
}
