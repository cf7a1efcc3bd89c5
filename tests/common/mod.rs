use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const MENUS: &str = "tests/fixtures/menus.csv";
pub const SUBMENUS: &str = "tests/fixtures/submenus.csv";
pub const SCREENS: &str = "tests/fixtures/screens.csv";

const TIMESTAMP: &str = "2024-01-01T00:00:00Z";

/// Writes a menus CSV with `rows` menus, every one of them `active`.
pub fn generate_menus(path: &Path, rows: u32, active: bool) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record([
        "id",
        "nombre",
        "url",
        "descripcion",
        "activo",
        "fechaCreacion",
        "fechaActualizacion",
    ])?;

    for i in 1..=rows {
        wtr.write_record([
            i.to_string().as_str(),
            &format!("Menu {i}"),
            &format!("/menu-{i}"),
            "",
            if active { "true" } else { "false" },
            TIMESTAMP,
            TIMESTAMP,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
