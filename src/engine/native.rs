//! Owned wrappers over the LibSass C API.
//!
//! A [`DataContext`] owns one `Sass_Data_Context` together with its options
//! and importer list; a [`Compiler`] borrows it for the parse and execute
//! phases and is deleted before anything is read back.

use crate::config::{Options, OutputStyle};
use crate::error::{Result, TranspileError};
use crate::importer::bridge::import_trampoline;
use crate::importer::Handle;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::ptr::NonNull;

impl From<OutputStyle> for sass_sys::Sass_Output_Style {
    fn from(style: OutputStyle) -> Self {
        match style {
            OutputStyle::Nested => sass_sys::Sass_Output_Style::SASS_STYLE_NESTED,
            OutputStyle::Expanded => sass_sys::Sass_Output_Style::SASS_STYLE_EXPANDED,
            OutputStyle::Compact => sass_sys::Sass_Output_Style::SASS_STYLE_COMPACT,
            OutputStyle::Compressed => sass_sys::Sass_Output_Style::SASS_STYLE_COMPRESSED,
        }
    }
}

/// Copy a native string; null becomes `None`
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: non-null and NUL-terminated per the contract.
        let value = unsafe { CStr::from_ptr(ptr) };
        Some(value.to_string_lossy().into_owned())
    }
}

fn c_string(field: &str, value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| TranspileError::InvalidInput(format!("{} contains a NUL byte", field)))
}

/// A LibSass data context compiling one source string
pub(crate) struct DataContext {
    raw: NonNull<sass_sys::Sass_Data_Context>,
}

impl DataContext {
    /// Create a context for `source`
    pub fn new(source: &str) -> Result<Self> {
        let source = c_string("source", source)?;

        // SAFETY: LibSass frees the source with the allocator used by
        // `sass_copy_c_string`, so it must own a copy.
        let raw = unsafe {
            let copy = sass_sys::sass_copy_c_string(source.as_ptr());
            if copy.is_null() {
                return Err(TranspileError::NativeResource(
                    "failed to copy source text".into(),
                ));
            }
            let ctx = sass_sys::sass_make_data_context(copy);
            if ctx.is_null() {
                sass_sys::sass_free_memory(copy.cast());
            }
            ctx
        };

        NonNull::new(raw)
            .map(|raw| Self { raw })
            .ok_or_else(|| TranspileError::NativeResource("failed to create data context".into()))
    }

    fn options(&self) -> *mut sass_sys::Sass_Options {
        // SAFETY: the context is live; the options are part of it.
        unsafe { sass_sys::sass_data_context_get_options(self.raw.as_ptr()) }
    }

    fn context(&self) -> *mut sass_sys::Sass_Context {
        // SAFETY: the context is live.
        unsafe { sass_sys::sass_data_context_get_context(self.raw.as_ptr()) }
    }

    /// Apply `options`, installing the importer callback when `importer` is set
    pub fn configure(&mut self, options: &Options, importer: Option<Handle>) -> Result<()> {
        let opts = self.options();

        let include_path = options.joined_include_paths()?;
        let strings: [(&str, Option<&str>, StringSetter); 5] = [
            (
                "include_paths",
                include_path.as_deref(),
                sass_sys::sass_option_set_include_path,
            ),
            (
                "input_path",
                options.input_path.as_deref(),
                sass_sys::sass_option_set_input_path,
            ),
            (
                "output_path",
                options.output_path.as_deref(),
                sass_sys::sass_option_set_output_path,
            ),
            (
                "source_map_filename",
                options.source_map_filename.as_deref(),
                sass_sys::sass_option_set_source_map_file,
            ),
            (
                "source_map_root",
                options.source_map_root.as_deref(),
                sass_sys::sass_option_set_source_map_root,
            ),
        ];

        for (field, value, setter) in strings {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = c_string(field, value)?;
            // SAFETY: string setters copy their argument.
            unsafe { setter(opts, value.as_ptr()) };
        }

        // SAFETY: `opts` belongs to this live context.
        unsafe {
            sass_sys::sass_option_set_output_style(opts, options.output_style.into());
            // Zero keeps the native default.
            if let Some(precision) = options.precision.filter(|p| *p != 0) {
                let precision = c_int::try_from(precision).map_err(|_| {
                    crate::config::ConfigError::InvalidValue {
                        field: "precision".into(),
                        reason: format!("must be at most {}", c_int::MAX),
                    }
                })?;
                sass_sys::sass_option_set_precision(opts, precision);
            }
            sass_sys::sass_option_set_source_map_contents(opts, options.source_map_contents);
            sass_sys::sass_option_set_omit_source_map_url(opts, options.omit_source_map_url);
            sass_sys::sass_option_set_source_map_embed(opts, options.enable_embedded_source_map);
            sass_sys::sass_option_set_source_comments(opts, false);
        }

        if let Some(handle) = importer {
            self.install_importer(handle)?;
        }

        // SAFETY: `opts` aliases the context's own options, which LibSass
        // detects and leaves in place.
        unsafe { sass_sys::sass_data_context_set_options(self.raw.as_ptr(), opts) };
        Ok(())
    }

    fn install_importer(&mut self, handle: Handle) -> Result<()> {
        let opts = self.options();

        // SAFETY: the importer list is handed to the options, which free it
        // together with the context. The cookie is an integer, never
        // dereferenced by LibSass.
        unsafe {
            let list = sass_sys::sass_make_importer_list(1);
            if list.is_null() {
                return Err(TranspileError::NativeResource(
                    "failed to allocate importer list".into(),
                ));
            }
            let importer =
                sass_sys::sass_make_importer(Some(import_trampoline), 0.0, handle.as_cookie());
            if importer.is_null() {
                sass_sys::sass_delete_importer_list(list);
                return Err(TranspileError::NativeResource(
                    "failed to allocate importer".into(),
                ));
            }
            sass_sys::sass_importer_set_list_entry(list, 0, importer);
            sass_sys::sass_option_set_c_importers(opts, list);
        }
        Ok(())
    }

    /// Create the compiler for this context
    pub fn compiler(&mut self) -> Result<Compiler<'_>> {
        // SAFETY: the context outlives the compiler through the borrow.
        let raw = unsafe { sass_sys::sass_make_data_compiler(self.raw.as_ptr()) };
        NonNull::new(raw)
            .map(|raw| Compiler {
                raw,
                _context: PhantomData,
            })
            .ok_or_else(|| TranspileError::NativeResource("failed to create compiler".into()))
    }

    /// Native error status; non-zero means compilation failed
    pub fn error_status(&self) -> i32 {
        // SAFETY: the context is live.
        unsafe { sass_sys::sass_context_get_error_status(self.context()) }
    }

    /// Native error payload as JSON
    pub fn error_json(&self) -> Option<String> {
        // SAFETY: the returned string is owned by the live context.
        unsafe { owned_string(sass_sys::sass_context_get_error_json(self.context())) }
    }

    /// Native plain-text error message
    pub fn error_message(&self) -> Option<String> {
        // SAFETY: the returned string is owned by the live context.
        unsafe { owned_string(sass_sys::sass_context_get_error_message(self.context())) }
    }

    /// Generated CSS
    pub fn output_string(&self) -> Option<String> {
        // SAFETY: as above.
        unsafe { owned_string(sass_sys::sass_context_get_output_string(self.context())) }
    }

    /// Generated source map
    pub fn source_map_string(&self) -> Option<String> {
        // SAFETY: as above.
        unsafe { owned_string(sass_sys::sass_context_get_source_map_string(self.context())) }
    }

    /// Source map file name as recorded in the options
    pub fn source_map_file(&self) -> Option<String> {
        // SAFETY: as above.
        unsafe { owned_string(sass_sys::sass_option_get_source_map_file(self.options())) }
    }
}

impl Drop for DataContext {
    fn drop(&mut self) {
        // SAFETY: no compiler can be alive here (it borrows the context), and
        // deleting the context also releases its options and importers.
        unsafe { sass_sys::sass_delete_data_context(self.raw.as_ptr()) };
    }
}

type StringSetter = unsafe extern "C" fn(*mut sass_sys::Sass_Options, *const c_char);

/// A LibSass compiler bound to a [`DataContext`]
pub(crate) struct Compiler<'ctx> {
    raw: NonNull<sass_sys::Sass_Compiler>,
    _context: PhantomData<&'ctx mut DataContext>,
}

impl Compiler<'_> {
    /// Parse phase; returns the native status
    pub fn parse(&mut self) -> i32 {
        // SAFETY: the compiler is live.
        unsafe { sass_sys::sass_compiler_parse(self.raw.as_ptr()) }
    }

    /// Execute phase; returns the native status
    pub fn execute(&mut self) -> i32 {
        // SAFETY: the compiler is live.
        unsafe { sass_sys::sass_compiler_execute(self.raw.as_ptr()) }
    }
}

impl Drop for Compiler<'_> {
    fn drop(&mut self) {
        // SAFETY: deleting the compiler is synchronous; no importer callback
        // can run after it returns.
        unsafe { sass_sys::sass_delete_compiler(self.raw.as_ptr()) };
    }
}
