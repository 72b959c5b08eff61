//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `mathnote_core` linkage without the Flutter/FFI runtime.
//! - Evaluate an expression passed as arguments, e.g. `mathnote_cli "2 + 3 * 4"`.

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("mathnote_core ping={}", mathnote_core::ping());
    println!("mathnote_core version={}", mathnote_core::core_version());

    let expression = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if expression.trim().is_empty() {
        return ExitCode::SUCCESS;
    }

    match mathnote_core::evaluate_str(&expression) {
        Ok(value) => {
            println!("{expression} = {value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}
