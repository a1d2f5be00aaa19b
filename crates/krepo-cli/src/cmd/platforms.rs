//! `krepo platforms`

use crossterm::style::Stylize;
use krepo_schema::Platform;

/// Print which release-asset fragment maps to which platform.
pub fn platforms() {
    println!("{}", format!("{:<24} {}", "FRAGMENT", "PLATFORM").bold());
    for (fragment, platform) in Platform::table() {
        println!("{fragment:<24} {platform}");
    }
}
