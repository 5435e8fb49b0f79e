/// Converts an optional, ordered sequence element by element.
///
/// The element order is kept and an absent sequence stays absent: `None` maps to `None`, while
/// `Some(vec![])` maps to `Some(vec![])`. The result is always freshly allocated.
///
/// ```
/// # use fleet_versioned::convert_list;
/// assert_eq!(convert_list(None::<Vec<u8>>, u16::from), None);
/// assert_eq!(convert_list(Some(Vec::<u8>::new()), u16::from), Some(vec![]));
/// assert_eq!(convert_list(Some(vec![3u8, 1, 2]), u16::from), Some(vec![3u16, 1, 2]));
/// ```
pub fn convert_list<A, B, F>(list: Option<Vec<A>>, f: F) -> Option<Vec<B>>
where
    F: FnMut(A) -> B,
{
    list.map(|list| {
        let mut converted = Vec::with_capacity(list.len());
        converted.extend(list.into_iter().map(f));
        converted
    })
}

/// Same as [`convert_list`], but with a fallible element conversion.
///
/// The first failing element aborts the conversion and no partial sequence is returned.
pub fn try_convert_list<A, B, E, F>(list: Option<Vec<A>>, mut f: F) -> Result<Option<Vec<B>>, E>
where
    F: FnMut(A) -> Result<B, E>,
{
    let Some(list) = list else {
        return Ok(None);
    };

    let mut converted = Vec::with_capacity(list.len());
    for element in list {
        converted.push(f(element)?);
    }

    Ok(Some(converted))
}
