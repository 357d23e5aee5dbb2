// SPDX-License-Identifier: BSD-3-Clause
//! Textual rendering of analysis results.

use std::io::{self, Write};

use crate::analysis::andersen::Analysis;
use crate::analysis::steensgaard::Classes;
use crate::ir::Module;

/// Dump an Andersen points-to map, one value per stanza.
pub fn andersen(out: &mut impl Write, module: &Module, analysis: &Analysis) -> io::Result<()> {
    writeln!(out, "Points-to Set:")?;
    writeln!(out, "=================")?;
    for (v, objects) in analysis.points_to.iter() {
        writeln!(out, "{}", module.value(v).name())?;
        if objects.is_empty() {
            writeln!(out, "  -> no points-to target")?;
        } else {
            for &object in objects {
                writeln!(out, "  -> {}", module.value(object).name())?;
            }
        }
    }
    Ok(())
}

/// Dump Steensgaard classes with the groups they point at.
pub fn steensgaard(out: &mut impl Write, module: &Module, classes: &Classes) -> io::Result<()> {
    for (root, members) in classes.groups() {
        writeln!(out, "Group {}: {{", module.value(root).name())?;
        for &member in members {
            writeln!(out, "  {}", module.value(member).name())?;
        }
        writeln!(out, "}}")?;
        write!(out, "Points-to group(s): {{")?;
        for target in classes.points_to(root) {
            write!(out, " {}", module.value(target).name())?;
        }
        writeln!(out, " }}")?;
    }
    Ok(())
}
