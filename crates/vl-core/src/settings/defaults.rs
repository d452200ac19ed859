use super::model::*;

impl Default for GeneralSettings {
    fn default() -> Self {
        Self { hub_name: None }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            general: GeneralSettings::default(),
        }
    }
}
