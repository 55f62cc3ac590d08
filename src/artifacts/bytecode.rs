use super::build_info::CodeRange;
use minicbor::{data::Type, Decoder};

/// Splits the code into the executable part and the trailing solc metadata
/// (cbor auxdata).
///
/// The last two bytes of the code store the length of the cbor encoded
/// metadata map placed right before them. Returns `None` if the suffix
/// does not decode as a cbor map.
fn split_cbor_auxdata(code: &[u8]) -> Option<(&[u8], &[u8])> {
    if code.len() < 2 {
        return None;
    }
    let (rest, length) = code.split_at(code.len() - 2);
    let length = u16::from_be_bytes([length[0], length[1]]) as usize;
    if length == 0 || length > rest.len() {
        return None;
    }

    let (prefix, auxdata) = rest.split_at(rest.len() - length);
    match Decoder::new(auxdata).map() {
        Ok(_) => Some((prefix, auxdata)),
        Err(_) => None,
    }
}

/// Returns the code without the trailing solc metadata. Code without
/// valid metadata is returned unchanged.
pub fn strip_cbor_auxdata(code: &[u8]) -> &[u8] {
    split_cbor_auxdata(code)
        .map(|(prefix, _)| prefix)
        .unwrap_or(code)
}

/// Compiler version stored under the `solc` key of the code metadata.
///
/// Releases store it as three bytes (major, minor, patch), nightly builds
/// as the full version string.
pub fn solc_version(code: &[u8]) -> Option<semver::Version> {
    let (_, auxdata) = split_cbor_auxdata(code)?;
    let mut decoder = Decoder::new(auxdata);
    let entries = decoder.map().ok()??;
    for _ in 0..entries {
        if decoder.str().ok()? != "solc" {
            decoder.skip().ok()?;
            continue;
        }
        return match decoder.datatype().ok()? {
            Type::Bytes => match decoder.bytes().ok()? {
                [major, minor, patch] => Some(semver::Version::new(
                    *major as u64,
                    *minor as u64,
                    *patch as u64,
                )),
                _ => None,
            },
            Type::String => semver::Version::parse(decoder.str().ok()?).ok(),
            _ => None,
        };
    }
    None
}

/// Overwrites immutable values with zeroes, as they are in the compiled code.
pub fn zero_immutables<'a>(
    code: &mut [u8],
    ranges: impl IntoIterator<Item = &'a CodeRange>,
) -> bool {
    for range in ranges {
        let slice = range
            .start
            .checked_add(range.length)
            .and_then(|end| code.get_mut(range.start..end));
        match slice {
            Some(slice) => slice.fill(0),
            None => return false,
        }
    }
    true
}

/// Checks whether deployed runtime code corresponds to the compiled one,
/// ignoring metadata hashes and immutable values. Both codes must be
/// produced by the same compiler version.
pub fn runtime_code_matches<'a>(
    deployed: &[u8],
    compiled: &[u8],
    immutables: impl IntoIterator<Item = &'a CodeRange>,
) -> bool {
    if deployed.len() != compiled.len() || solc_version(deployed) != solc_version(compiled) {
        return false;
    }
    let mut deployed = deployed.to_vec();
    if !zero_immutables(&mut deployed, immutables) {
        return false;
    }
    strip_cbor_auxdata(&deployed) == strip_cbor_auxdata(compiled)
}
