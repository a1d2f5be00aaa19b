//! Icons and column widths for console output.

/// Status markers printed before each line.
#[derive(Debug, Clone, Copy)]
pub struct Icons {
    /// Admitted package, filed archive, written catalog.
    pub ok: &'static str,
    pub failed: &'static str,
    pub caution: &'static str,
    pub note: &'static str,
    /// Package left out of the catalog.
    pub left_out: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            ok: "✓",
            failed: "✗",
            caution: "⚠",
            note: "ℹ",
            left_out: "○",
        }
    }
}

/// Column widths of the per-package lines.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    /// Package directory name.
    pub dir: usize,
    /// Add-on version.
    pub version: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self { dir: 36, version: 12 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Theme {
    pub icons: Icons,
    pub columns: Columns,
}
