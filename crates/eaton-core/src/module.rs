// Probe module names as they appear in `?module=input,branch`.

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::error::ScrapeError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Module {
    /// Power input with its phases.
    Input,
    /// Branch circuits of the power distribution.
    Branch,
}

impl Module {
    /// Used when the `module` parameter is absent or blank.
    pub const DEFAULT: Self = Self::Input;

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Parse a comma-separated module list.
    ///
    /// Names are trimmed and repeats collapse to their first occurrence.
    /// The first unknown name fails the whole list.
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<Self>, ScrapeError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(vec![Self::DEFAULT]),
            Some(raw) => raw,
        };

        let mut modules = Vec::new();
        for name in raw.split(',').map(str::trim) {
            let module: Self = name.parse().map_err(|_| ScrapeError::UnknownModule {
                module: name.into(),
            })?;
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
        Ok(modules)
    }
}
