use std::ffi::CStr;

/// Resolve an interface index to its current name. Returns `None` if no
/// interface has this index (anymore).
pub(crate) fn ifindex_to_name(ifindex: i32) -> Option<String> {
    if ifindex <= 0 {
        return None;
    }

    let mut buf = [0 as libc::c_char; libc::IF_NAMESIZE];
    // The buffer is IF_NAMESIZE long, as required by if_indextoname(3).
    let name = unsafe { libc::if_indextoname(ifindex as libc::c_uint, buf.as_mut_ptr()) };
    if name.is_null() {
        return None;
    }

    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(name.to_string_lossy().into_owned())
}

/// Name used to display an interface: its name if it still exists, its index
/// otherwise.
pub(crate) fn ifindex_display(ifindex: i32, name: Option<String>) -> String {
    name.unwrap_or_else(|| format!("if#{ifindex}"))
}
