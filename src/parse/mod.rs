pub mod detect;
pub mod document;
pub mod gherkin;
pub mod sections;
pub mod tagged;
pub mod ui;

pub use self::detect::{DetectedProfile, DetectionConfidence, detect_profile};
pub use self::document::{
    AcceptanceCriterion, ExecutionStatus, Requirement, SpecEntities, TestCase, UserStory,
    parse_backlog, parse_spec_document, parse_tests_document,
};
pub use self::gherkin::{GherkinTriple, extract_gherkin};
pub use self::sections::{Section, find_section, split_all_headings, split_sections};
pub use self::tagged::{TaggedItem, extract_bullets, extract_family_ids, extract_tagged_items};
pub use self::ui::{UiStructure, extract_ui_structure};
