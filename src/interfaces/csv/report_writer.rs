use crate::application::hierarchy::ScreenStatus;
use crate::error::Result;
use std::io::Write;

/// Writes the effective-status report as CSV.
pub struct StatusReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatusReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_statuses<I>(&mut self, statuses: I) -> Result<()>
    where
        I: IntoIterator<Item = ScreenStatus>,
    {
        for status in statuses {
            self.writer.serialize(status)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::{MenuId, ScreenId, SubmenuId};

    #[test]
    fn test_writes_header_and_rows() {
        let mut out = Vec::new();
        StatusReportWriter::new(&mut out)
            .write_statuses(vec![ScreenStatus {
                id: ScreenId(100),
                name: "Biometria".to_string(),
                menu_id: MenuId(1),
                submenu_id: SubmenuId(10),
                active: true,
                effective: false,
                orphan: false,
            }])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "id,nombre,menu_id,submenu_id,activo,effective,orphan\n100,Biometria,1,10,true,false,false\n"
        );
    }
}
