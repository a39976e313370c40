//! Human-readable IL dumps for logs and tests.

use crate::module::{IlFunction, IlModule};
use std::fmt::Write;

pub fn dump_function(function: &IlFunction) -> String {
    let mut out = String::new();
    let params: Vec<String> =
        function.params.iter().map(|p| format!("{}: {}", p.name, p.ty)).collect();
    let _ = writeln!(
        out,
        "fn {}({}) -> {} {{",
        function.name,
        params.join(", "),
        function.return_type
    );
    for block in &function.blocks {
        let _ = writeln!(out, "{}:", block.id);
        for instruction in &block.instructions {
            let _ = writeln!(out, "  {instruction}");
        }
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn dump_module(module: &IlModule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {}", module.name);
    for global in &module.globals {
        let _ = writeln!(out, "global {}: {}", global.name, global.ty);
    }
    for map in &module.maps {
        let _ = writeln!(out, "map {} @ ${:04X}: {}", map.name, map.address, map.ty);
    }
    for string in &module.strings {
        let _ = writeln!(out, "string {} = {:?}", string.label, string.value);
    }
    for function in &module.functions {
        out.push_str(&dump_function(function));
    }
    out
}
