//! The native importer callback.
//!
//! LibSass invokes [`import_trampoline`] synchronously, on the thread that
//! drives the compiler, for every `@import` it encounters. The trampoline
//! decodes the handle cookie, asks the registered resolver, and answers with a
//! single import entry. A resolver that is missing, declines, fails or panics
//! leaves the import to LibSass's own file loader.

use super::pool::Handle;
use super::registry::ImporterRegistry;
use super::ResolvedImport;
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing::warn;

/// How an import is answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDecision {
    /// Use the resolver's path, and its body when present
    Resolved(ResolvedImport),
    /// Let LibSass load the original path itself
    Default,
}

/// Ask the resolver registered under `handle` how to load `url`.
///
/// Resolver errors and panics are logged and answered with
/// [`ImportDecision::Default`].
pub fn resolve_import(
    registry: &ImporterRegistry,
    handle: Option<Handle>,
    url: &str,
    prev: &str,
) -> ImportDecision {
    let Some(entry) = handle.and_then(|h| registry.lookup(h)) else {
        return ImportDecision::Default;
    };
    entry.record_call();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.resolver().resolve(url, prev)));

    match outcome {
        Ok(Ok(Some(resolved))) => ImportDecision::Resolved(resolved),
        Ok(Ok(None)) => ImportDecision::Default,
        Ok(Err(e)) => {
            warn!(url, prev, error = %e, "Import resolver failed, using default loader");
            ImportDecision::Default
        }
        Err(_) => {
            warn!(url, prev, "Import resolver panicked, using default loader");
            ImportDecision::Default
        }
    }
}

/// Importer callback installed on every session that has a resolver.
///
/// # Safety
/// Only LibSass may call this, with a valid `url`, the importer entry created
/// by the session, and the running compiler.
pub(crate) unsafe extern "C" fn import_trampoline(
    url: *const c_char,
    importer: sass_sys::Sass_Importer_Entry,
    compiler: *mut sass_sys::Sass_Compiler,
) -> sass_sys::Sass_Import_List {
    let answered = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the arguments come straight from LibSass.
        unsafe { answer_import(url, importer, compiler) }
    }));

    // A null list means "not handled": LibSass falls back to its own loader.
    answered.unwrap_or_else(|_| {
        warn!("Import callback panicked, using default loader");
        ptr::null_mut()
    })
}

unsafe fn answer_import(
    url: *const c_char,
    importer: sass_sys::Sass_Importer_Entry,
    compiler: *mut sass_sys::Sass_Compiler,
) -> sass_sys::Sass_Import_List {
    if url.is_null() {
        return ptr::null_mut();
    }

    // SAFETY: LibSass passes a NUL-terminated path that outlives this call.
    let url_str = unsafe { CStr::from_ptr(url) }.to_string_lossy();
    // SAFETY: `importer` and `compiler` are live for the duration of the call.
    let handle = Handle::from_cookie(unsafe { sass_sys::sass_importer_get_cookie(importer) });
    let prev = unsafe { parent_path(compiler) };

    let decision = resolve_import(ImporterRegistry::global(), handle, &url_str, &prev);

    // SAFETY: `url` is valid, see above.
    let entry = unsafe { make_entry(url, decision) };
    if entry.is_null() {
        return ptr::null_mut();
    }

    // SAFETY: plain allocation calls; the list takes ownership of the entry.
    unsafe {
        let list = sass_sys::sass_make_import_list(1);
        if list.is_null() {
            sass_sys::sass_delete_import(entry);
            return ptr::null_mut();
        }
        sass_sys::sass_import_set_list_entry(list, 0, entry);
        list
    }
}

/// Path of the file containing the import being resolved
unsafe fn parent_path(compiler: *mut sass_sys::Sass_Compiler) -> Cow<'static, str> {
    if compiler.is_null() {
        return Cow::Borrowed("");
    }

    // SAFETY: the compiler is live; the import stack is non-empty while an
    // import is being resolved, and a null entry is checked below.
    unsafe {
        let last = sass_sys::sass_compiler_get_last_import(compiler);
        if last.is_null() {
            return Cow::Borrowed("");
        }
        let path = sass_sys::sass_import_get_imp_path(last);
        if path.is_null() {
            return Cow::Borrowed("");
        }
        Cow::Owned(CStr::from_ptr(path).to_string_lossy().into_owned())
    }
}

/// Build the native import entry for `decision`.
///
/// LibSass copies the path and takes ownership of the body, so the body is
/// allocated with `sass_copy_c_string`.
unsafe fn make_entry(url: *const c_char, decision: ImportDecision) -> sass_sys::Sass_Import_Entry {
    if let ImportDecision::Resolved(resolved) = decision {
        match native_strings(&resolved) {
            Some((path, body)) => {
                // SAFETY: both strings are NUL-terminated and live across the calls.
                return unsafe {
                    let source = match &body {
                        Some(body) => sass_sys::sass_copy_c_string(body.as_ptr()),
                        None => ptr::null_mut(),
                    };
                    sass_sys::sass_make_import_entry(path.as_ptr(), source, ptr::null_mut())
                };
            }
            None => warn!(
                path = %resolved.path,
                "Resolved import contains a NUL byte, using default loader"
            ),
        }
    }

    // SAFETY: `url` is the NUL-terminated path LibSass handed us.
    unsafe { sass_sys::sass_make_import_entry(url, ptr::null_mut(), ptr::null_mut()) }
}

fn native_strings(resolved: &ResolvedImport) -> Option<(CString, Option<CString>)> {
    let path = CString::new(resolved.path.as_str()).ok()?;
    let body = match resolved.body.as_deref() {
        Some(body) if !body.is_empty() => Some(CString::new(body).ok()?),
        _ => None,
    };
    Some((path, body))
}
