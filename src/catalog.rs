//! The fixed model catalog and menu selection.
//!
//! Menu numbers are 1-indexed positions into [`MODELS`].

use crate::error::{Error, Result};

/// Models offered by the proxy, in menu order.
pub const MODELS: [&str; 18] = [
    "DeepSeek-V1",
    "DeepSeek-V2",
    "DeepSeek-V2.5",
    "DeepSeek-V3",
    "DeepSeek-V3-0324",
    "DeepSeek-V3.1",
    "DeepSeek-V3.2",
    "DeepSeek-R1",
    "DeepSeek-R1-0528",
    "DeepSeek-R1-Distill",
    "DeepSeek-Prover-V1",
    "DeepSeek-Prover-V1.5",
    "DeepSeek-Prover-V2",
    "DeepSeek-VL",
    "DeepSeek-Coder",
    "DeepSeek-Coder-V2",
    "DeepSeek-Coder-6.7B-base",
    "DeepSeek-Coder-6.7B-instruct",
];

/// Maps a menu number typed by the user to a catalog entry.
///
/// Accepts `1..=MODELS.len()` after trimming.  Anything else, including
/// zero, negative numbers and non-numeric text, is an
/// [`Error::InvalidSelection`].
///
/// # Examples
///
/// ```
/// # use seekproxy::catalog::select;
/// assert_eq!(select("8").unwrap(), "DeepSeek-R1");
/// assert!(select("0").is_err());
/// ```
pub fn select(input: &str) -> Result<&'static str> {
    let trimmed = input.trim();
    let number: i64 = trimmed
        .parse()
        .map_err(|_| Error::invalid_selection(trimmed, "enter a number from the menu"))?;
    if number < 1 || number > MODELS.len() as i64 {
        return Err(Error::invalid_selection(
            trimmed,
            format!("choose a number between 1 and {}", MODELS.len()),
        ));
    }
    Ok(MODELS[(number - 1) as usize])
}

/// Resolves a model given either as a menu number or as its exact name.
pub fn resolve(value: &str) -> Result<&'static str> {
    let trimmed = value.trim();
    if let Some(model) = MODELS.iter().copied().find(|model| *model == trimmed) {
        return Ok(model);
    }
    select(trimmed).map_err(|_| {
        Error::invalid_selection(
            trimmed,
            format!(
                "not a model name or a number between 1 and {}",
                MODELS.len()
            ),
        )
    })
}
