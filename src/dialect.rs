//! Indented syntax conversion and native version strings.

use crate::engine::native::owned_string;
use crate::error::{Result, TranspileError};
use std::ffi::CString;
use std::os::raw::c_int;

/// Prettify level passed to `sass2scss`: one declaration per line.
const SASS2SCSS_PRETTIFY: c_int = 1;

/// Convert indented-syntax (`.sass`) source to SCSS.
///
/// The conversion is purely textual; errors in the source surface when the
/// result is compiled.
pub fn sass_to_scss(source: &str) -> Result<String> {
    let source = CString::new(source)
        .map_err(|_| TranspileError::InvalidInput("source contains a NUL byte".into()))?;

    // SAFETY: `source` is NUL-terminated; the result is allocated by LibSass
    // and released with its own allocator once copied.
    unsafe {
        let converted = sass_sys::sass2scss(source.as_ptr(), SASS2SCSS_PRETTIFY);
        if converted.is_null() {
            return Err(TranspileError::NativeResource(
                "sass2scss returned no output".into(),
            ));
        }
        let scss = owned_string(converted).unwrap_or_default();
        sass_sys::sass_free_memory(converted.cast());
        Ok(scss)
    }
}

/// Version of the linked LibSass
pub fn libsass_version() -> String {
    // SAFETY: returns a static string.
    unsafe { owned_string(sass_sys::libsass_version()) }.unwrap_or_default()
}

/// Version of the bundled sass2scss converter
pub fn sass2scss_version() -> String {
    // SAFETY: returns a static string.
    unsafe { owned_string(sass_sys::sass2scss_version()) }.unwrap_or_default()
}
