//! Driver listing command.

use std::io::Write;

use anyhow::Result;
use fleet_core::{Snapshot, TripSource};

use super::util::driver_label;

pub fn run<W: Write>(writer: &mut W, snapshot: &Snapshot) -> Result<()> {
    let drivers = snapshot.drivers();

    if drivers.is_empty() {
        writeln!(writer, "No drivers in snapshot.")?;
        return Ok(());
    }

    writeln!(writer, "DRIVERS ({})", drivers.len())?;
    for driver_id in &drivers {
        writeln!(writer, "{}", driver_label(snapshot, driver_id))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use insta::assert_snapshot;

    #[test]
    fn test_lists_drivers_with_names() {
        let ctx = fixtures::context();
        let mut out = Vec::new();
        run(&mut out, &ctx.snapshot).unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        DRIVERS (2)
        d-1 (Mari Maasikas)
        d-2
        ");
    }

    #[test]
    fn test_empty_snapshot() {
        let mut out = Vec::new();
        run(&mut out, &Snapshot::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No drivers in snapshot.\n");
    }
}
