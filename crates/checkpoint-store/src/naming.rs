//! Reversible mapping between operation ids and log file names.

const EXTENSION: &str = ".jsonl";

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_')
}

pub(crate) fn file_name(operation: &str) -> String {
    let mut out = String::with_capacity(operation.len() + EXTENSION.len());
    for byte in operation.bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out.push_str(EXTENSION);
    out
}

pub(crate) fn operation_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(EXTENSION)?;
    let bytes = stem.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'%' => {
                let hex = stem.get(idx + 1..idx + 3)?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                idx += 3;
            }
            byte if is_plain(byte) => {
                decoded.push(byte);
                idx += 1;
            }
            _ => return None,
        }
    }
    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_path_separators_and_dots() {
        let name = file_name("search/../like:42");
        assert!(!name.contains('/'));
        assert!(!name.trim_end_matches(EXTENSION).contains('.'));
        assert_eq!(
            operation_from_file_name(&name).as_deref(),
            Some("search/../like:42")
        );
    }

    #[test]
    fn rejects_foreign_files() {
        assert_eq!(operation_from_file_name("notes.txt"), None);
        assert_eq!(operation_from_file_name("bad%zz.jsonl"), None);
        assert_eq!(operation_from_file_name(".tmp.jsonl"), None);
    }
}
