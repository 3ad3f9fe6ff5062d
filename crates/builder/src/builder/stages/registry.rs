//! Stage registry - single source of truth for the pipeline order.

use super::{
    externals::Externals, firmware::Firmware, jonchki::Jonchki, lua::Lua,
    lua_requirements::LuaRequirements, system_packages::SystemPackages, Stage,
};
use crate::builder::error::BuildError;

/// All stages, in the order `all` runs them.
pub static STAGES: &[&dyn Stage] = &[
    &SystemPackages,
    &Jonchki,
    &Firmware,
    &LuaRequirements,
    &Externals,
    &Lua,
];

/// Get stage by name.
#[must_use]
pub fn get(name: &str) -> Option<&'static dyn Stage> {
    STAGES.iter().find(|s| s.name() == name).copied()
}

/// List all stage names.
pub fn names() -> impl Iterator<Item = &'static str> {
    STAGES.iter().map(|s| s.name())
}

/// Resolve names to stages in pipeline order, whatever order they were given in.
pub fn select(requested: &[String]) -> Result<Vec<&'static dyn Stage>, BuildError> {
    for name in requested {
        if get(name).is_none() {
            log::error!("Known stages: {}", names().collect::<Vec<_>>().join(", "));
            return Err(BuildError::UnknownStage(name.clone()));
        }
    }
    Ok(STAGES
        .iter()
        .filter(|s| requested.iter().any(|r| r == s.name()))
        .copied()
        .collect())
}
