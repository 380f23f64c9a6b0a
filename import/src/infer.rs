use strata_core::value::ColumnType;

/// Infer a column type from sampled tokens: `Uint32` when every non-empty
/// sample is all digits and fits in 32 bits, otherwise `String`. Empty
/// samples are neutral (they default to 0 in numeric columns); an all-empty
/// sample set stays `String`.
pub fn infer_type<'a>(samples: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut saw_digits = false;
    for token in samples {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !token.bytes().all(|b| b.is_ascii_digit()) || token.parse::<u32>().is_err() {
            return ColumnType::String;
        }
        saw_digits = true;
    }
    if saw_digits {
        ColumnType::Uint32
    } else {
        ColumnType::String
    }
}
