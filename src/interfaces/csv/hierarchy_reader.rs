use crate::domain::hierarchy::{MenuEntity, ScreenEntity, SubmenuEntity};
use crate::error::{PortalError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;

/// Reads one flat hierarchy table (menus, submenus or screens) from CSV.
///
/// Headers use the source field names (`id,nombre,url,descripcion,activo,
/// fechaCreacion,fechaActualizacion[,menuId][,submenuId]`). Whitespace is
/// trimmed and ids may be quoted.
pub struct HierarchyReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> HierarchyReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows; a bad row yields an error without stopping the rest.
    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PortalError::from))
    }

    pub fn menus(self) -> impl Iterator<Item = Result<MenuEntity>> {
        self.records()
    }

    pub fn submenus(self) -> impl Iterator<Item = Result<SubmenuEntity>> {
        self.records()
    }

    pub fn screens(self) -> impl Iterator<Item = Result<ScreenEntity>> {
        self.records()
    }
}
