//! List-kinds command implementation.

use decl_critic::ErrorKind;

/// Prints every finding kind with its default enablement.
pub fn run() {
    println!("Available finding kinds:\n");
    for kind in ErrorKind::ALL {
        let default = if kind.default_enabled() {
            "on by default"
        } else {
            "off by default"
        };
        println!("  {:<34} {}", kind.name(), default);
    }
    println!("\nEnable or disable kinds with --enable/--disable, or in the [kinds] config table.");
}
