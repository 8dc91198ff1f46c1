//! C entry points for hosting the FITS channel reader.
//!
//! A host opens a file with [`fits_reader_open`], queries its shape and
//! channel names, then asks for rows with [`fits_reader_engine`], possibly
//! from several threads at once. Handles are released with
//! [`fits_reader_close`].

use fits_reader::{sniff, Channel, ChannelSet, ErrorSink, FitsReader, ReaderOptions, Row};
use libc::{c_char, c_int, c_void, size_t};
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::Arc;

/// Error codes
pub const FITS_READER_OK: c_int = 0;
pub const FITS_READER_NULL_POINTER: c_int = -1;
pub const FITS_READER_INVALID_UTF8: c_int = -2;
pub const FITS_READER_ERRORED: c_int = -3;
pub const FITS_READER_OUT_OF_RANGE: c_int = -4;

/// Host callback receiving one NUL-terminated error message per failure.
pub type FitsReaderErrorCallback = extern "C" fn(user: *mut c_void, message: *const c_char);

/// Image shape as seen by the host.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FitsReaderInfo {
    pub width: size_t,
    pub height: size_t,
    pub channels: size_t,
}

/// Opaque handle: an open reader, or the message of why opening failed.
pub struct FitsReaderHandle {
    reader: Option<FitsReader>,
    error: Option<CString>,
    names: Vec<CString>,
}

impl FitsReaderHandle {
    fn errored(message: &str) -> Self {
        FitsReaderHandle {
            reader: None,
            error: Some(to_cstring(message)),
            names: Vec::new(),
        }
    }
}

struct CallbackSink {
    callback: FitsReaderErrorCallback,
    user: *mut c_void,
}

// The host promises its callback and user pointer may be used from any
// thread for as long as the handle is open.
unsafe impl Send for CallbackSink {}
unsafe impl Sync for CallbackSink {}

impl ErrorSink for CallbackSink {
    fn report(&self, message: &str) {
        let message = to_cstring(message);
        (self.callback)(self.user, message.as_ptr());
    }
}

fn to_cstring(message: &str) -> CString {
    CString::new(message.replace('\0', " ")).unwrap_or_default()
}

/// Check whether `block` starts with the FITS signature.
/// Returns: 1 if it does, 0 otherwise (including a NULL block)
///
/// # Safety
/// `block` must be NULL or point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_test(block: *const u8, len: size_t) -> c_int {
    if block.is_null() {
        return 0;
    }
    let bytes = std::slice::from_raw_parts(block, len);
    c_int::from(sniff(bytes))
}

/// Open a FITS file and catalogue its image extensions.
/// path: Path to the file (null-terminated C string)
/// callback: Optional error callback, called with `user` for each failure
/// Returns: A handle, NULL only if `path` is NULL. A handle that failed to
/// open reports its message through `fits_reader_error`.
///
/// # Safety
/// `path` must be NULL or a valid C string. `callback` and `user` must stay
/// usable from any thread until the handle is closed.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_open(
    path: *const c_char,
    callback: Option<FitsReaderErrorCallback>,
    user: *mut c_void,
) -> *mut FitsReaderHandle {
    if path.is_null() {
        return ptr::null_mut();
    }
    let sink: Option<Arc<dyn ErrorSink>> = callback.map(|callback| {
        Arc::new(CallbackSink { callback, user }) as Arc<dyn ErrorSink>
    });

    let handle = match CStr::from_ptr(path).to_str() {
        Err(_) => {
            let message = "Error reading file: path is not valid UTF-8";
            if let Some(sink) = &sink {
                sink.report(message);
            }
            FitsReaderHandle::errored(message)
        }
        Ok(path) => match FitsReader::open(path, &ReaderOptions::default(), sink) {
            Ok(reader) => FitsReaderHandle {
                names: reader
                    .info()
                    .channels
                    .iter()
                    .map(|c| to_cstring(c.as_str()))
                    .collect(),
                reader: Some(reader),
                error: None,
            },
            Err(e) => {
                log::debug!("Handle for {path} is errored: {e}");
                FitsReaderHandle::errored(&e.to_string())
            }
        },
    };
    Box::into_raw(Box::new(handle))
}

/// Message explaining why the handle failed to open.
/// Returns: NULL if the handle is NULL or opened successfully. The string
/// lives as long as the handle.
///
/// # Safety
/// `handle` must be NULL or a live handle from `fits_reader_open`.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_error(handle: *const FitsReaderHandle) -> *const c_char {
    match handle.as_ref().and_then(|h| h.error.as_ref()) {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    }
}

/// Fill `out` with the image width, height and channel count.
///
/// # Safety
/// `handle` must be NULL or a live handle; `out` must be NULL or writable.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_info(
    handle: *const FitsReaderHandle,
    out: *mut FitsReaderInfo,
) -> c_int {
    if handle.is_null() || out.is_null() {
        return FITS_READER_NULL_POINTER;
    }
    let Some(reader) = &(*handle).reader else {
        return FITS_READER_ERRORED;
    };
    let info = reader.info();
    *out = FitsReaderInfo {
        width: info.width,
        height: info.height,
        channels: info.depth(),
    };
    FITS_READER_OK
}

/// Name of channel `index`, in sorted order.
/// Returns: NULL if out of range or the handle errored. The string lives as
/// long as the handle.
///
/// # Safety
/// `handle` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_channel_name(
    handle: *const FitsReaderHandle,
    index: size_t,
) -> *const c_char {
    match handle.as_ref().and_then(|h| h.names.get(index)) {
        Some(name) => name.as_ptr(),
        None => ptr::null(),
    }
}

/// Decode columns `[x, r)` of row `y` for `count` channels.
/// names: Channel names (null-terminated C strings)
/// buffers: One output buffer of `r - x` floats per name
/// Returns: FITS_READER_OK once every channel has been attempted, or
/// FITS_READER_OUT_OF_RANGE if `r < x` or a coordinate is `SIZE_MAX`.
/// Per-channel read failures go to the error callback; buffers of channels
/// the file lacks are left untouched.
///
/// # Safety
/// `names` and `buffers` must each point to `count` valid entries, and every
/// buffer must hold `r - x` floats.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_engine(
    handle: *const FitsReaderHandle,
    y: size_t,
    x: size_t,
    r: size_t,
    names: *const *const c_char,
    buffers: *const *mut f32,
    count: size_t,
) -> c_int {
    if handle.is_null() {
        return FITS_READER_NULL_POINTER;
    }
    let Some(reader) = &(*handle).reader else {
        return FITS_READER_ERRORED;
    };
    if r < x || y.checked_add(1).is_none() || x.checked_add(1).is_none() {
        return FITS_READER_OUT_OF_RANGE;
    }
    if count == 0 {
        return FITS_READER_OK;
    }
    if names.is_null() || buffers.is_null() {
        return FITS_READER_NULL_POINTER;
    }

    let names = std::slice::from_raw_parts(names, count);
    let buffers = std::slice::from_raw_parts(buffers, count);
    let mut requested = Vec::with_capacity(count);
    for (&name, &buffer) in names.iter().zip(buffers) {
        if name.is_null() || buffer.is_null() {
            return FITS_READER_NULL_POINTER;
        }
        let Ok(name) = CStr::from_ptr(name).to_str() else {
            return FITS_READER_INVALID_UTF8;
        };
        requested.push((Channel::from(name), buffer));
    }

    let channels: ChannelSet = requested.iter().map(|(c, _)| c.clone()).collect();
    let mut row = Row::new(x, r);
    reader.engine(y, x, r, &channels, &mut row);

    for (channel, buffer) in requested {
        if let Some(values) = row.get(&channel) {
            std::slice::from_raw_parts_mut(buffer, values.len()).copy_from_slice(values);
        }
    }
    FITS_READER_OK
}

/// Close the file and free the handle.
///
/// # Safety
/// `handle` must be NULL or a live handle, and is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn fits_reader_close(handle: *mut FitsReaderHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fits_hdu::fixtures::{FitsBuilder, ImageSpec};
    use std::sync::Mutex;

    extern "C" fn collect(user: *mut c_void, message: *const c_char) {
        let seen = unsafe { &*(user as *const Mutex<Vec<String>>) };
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        seen.lock().unwrap().push(text);
    }

    fn path_of(path: &std::path::Path) -> CString {
        CString::new(path.to_str().unwrap()).unwrap()
    }

    fn two_channel_file(dir: &tempfile::TempDir) -> CString {
        let path = dir.path().join("two.fits");
        FitsBuilder::new()
            .empty_primary()
            .image(ImageSpec::new(16, &[5, 3]).named("SCI").constant(4.0))
            .image(ImageSpec::new(-32, &[5, 3]).named("ERR").constant(0.5))
            .write_to(&path)
            .unwrap();
        path_of(&path)
    }

    #[test]
    fn test_sniffs_signature() {
        let block = b"SIMPLE  =                    T";
        unsafe {
            assert_eq!(fits_reader_test(block.as_ptr(), block.len()), 1);
            assert_eq!(fits_reader_test(block.as_ptr(), 3), 0);
            assert_eq!(fits_reader_test(ptr::null(), 10), 0);
        }
    }

    #[test]
    fn open_query_decode_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_channel_file(&dir);
        unsafe {
            let handle = fits_reader_open(path.as_ptr(), None, ptr::null_mut());
            assert!(!handle.is_null());
            assert!(fits_reader_error(handle).is_null());

            let mut info = FitsReaderInfo::default();
            assert_eq!(fits_reader_info(handle, &mut info), FITS_READER_OK);
            assert_eq!(
                info,
                FitsReaderInfo {
                    width: 5,
                    height: 3,
                    channels: 2
                }
            );
            let first = CStr::from_ptr(fits_reader_channel_name(handle, 0));
            assert_eq!(first.to_str().unwrap(), "ERR.r");
            assert!(fits_reader_channel_name(handle, 2).is_null());

            let names = [c"SCI.r".as_ptr(), c"ERR.r".as_ptr(), c"NONE.r".as_ptr()];
            let mut sci = [0.0f32; 3];
            let mut err = [0.0f32; 3];
            let mut none = [-1.0f32; 3];
            let buffers = [sci.as_mut_ptr(), err.as_mut_ptr(), none.as_mut_ptr()];
            let status =
                fits_reader_engine(handle, 2, 1, 4, names.as_ptr(), buffers.as_ptr(), 3);
            assert_eq!(status, FITS_READER_OK);
            assert_eq!(sci, [4.0; 3]);
            assert_eq!(err, [0.5; 3]);
            assert_eq!(none, [-1.0; 3]);

            fits_reader_close(handle);
        }
    }

    #[test]
    fn failed_open_yields_errored_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_of(&dir.path().join("missing.fits"));
        let seen = Mutex::new(Vec::<String>::new());
        unsafe {
            let handle = fits_reader_open(
                path.as_ptr(),
                Some(collect),
                &seen as *const _ as *mut c_void,
            );
            assert!(!handle.is_null());
            let message = CStr::from_ptr(fits_reader_error(handle));
            assert!(message.to_str().unwrap().starts_with("Error reading file"));

            let mut info = FitsReaderInfo::default();
            assert_eq!(fits_reader_info(handle, &mut info), FITS_READER_ERRORED);
            assert_eq!(
                fits_reader_engine(handle, 0, 0, 1, ptr::null(), ptr::null(), 0),
                FITS_READER_ERRORED
            );
            fits_reader_close(handle);
        }
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].ends_with(": could not open the named file"));
    }

    #[test]
    fn null_arguments_are_rejected() {
        unsafe {
            assert!(fits_reader_open(ptr::null(), None, ptr::null_mut()).is_null());
            assert!(fits_reader_error(ptr::null()).is_null());
            assert_eq!(
                fits_reader_info(ptr::null(), ptr::null_mut()),
                FITS_READER_NULL_POINTER
            );
            assert_eq!(
                fits_reader_engine(ptr::null(), 0, 0, 1, ptr::null(), ptr::null(), 1),
                FITS_READER_NULL_POINTER
            );
            fits_reader_close(ptr::null_mut());
        }
    }

    #[test]
    fn inverted_span_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_channel_file(&dir);
        unsafe {
            let handle = fits_reader_open(path.as_ptr(), None, ptr::null_mut());
            assert_eq!(
                fits_reader_engine(handle, 0, 3, 1, ptr::null(), ptr::null(), 0),
                FITS_READER_OUT_OF_RANGE
            );
            fits_reader_close(handle);
        }
    }

    #[test]
    fn coordinates_at_size_max_are_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_channel_file(&dir);
        unsafe {
            let handle = fits_reader_open(path.as_ptr(), None, ptr::null_mut());
            let names = [c"SCI.r".as_ptr()];
            let mut sci = [-1.0f32; 1];
            let buffers = [sci.as_mut_ptr()];
            assert_eq!(
                fits_reader_engine(handle, usize::MAX, 0, 1, names.as_ptr(), buffers.as_ptr(), 1),
                FITS_READER_OUT_OF_RANGE
            );
            assert_eq!(
                fits_reader_engine(
                    handle,
                    0,
                    usize::MAX,
                    usize::MAX,
                    names.as_ptr(),
                    buffers.as_ptr(),
                    1
                ),
                FITS_READER_OUT_OF_RANGE
            );
            assert_eq!(sci, [-1.0]);
            fits_reader_close(handle);
        }
    }
}
