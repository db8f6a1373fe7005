//! Inspection and transformation of encoded arrays and objects.
//!
//! All functions consume zero-copy [`Slice`]s and produce fresh, sealed
//! [`Builder`]s; the inputs are never modified.

use std::collections::HashSet;

use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::slice::Slice;
use crate::types::Value;

/// Attribute names of an object, in index order (sorted order for sorted
/// layouts, insertion order otherwise).
pub fn keys(slice: Slice<'_>) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in slice.object_iter()? {
        let (key, _) = entry?;
        out.push(key.copy_string()?);
    }
    Ok(out)
}

/// Attribute values of an object, in index order, as a new array.
pub fn values(slice: Slice<'_>) -> Result<Builder> {
    let mut builder = Builder::new();
    builder.open_array()?;
    for entry in slice.object_iter()? {
        let (_, value) = entry?;
        builder.add_slice(value)?;
    }
    builder.close()?;
    Ok(builder)
}

/// Calls `f` for each array member in order until it returns `false`.
pub fn for_each<'a, F>(slice: Slice<'a>, mut f: F) -> Result<()>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    for (index, member) in slice.array_iter()?.enumerate() {
        if !f(member?, index as u64) {
            break;
        }
    }
    Ok(())
}

/// New array retaining the members for which `f` returns `true`,
/// preserving order. `f` sees every member.
pub fn filter<'a, F>(slice: Slice<'a>, mut f: F) -> Result<Builder>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    let mut builder = Builder::new();
    builder.open_array()?;
    for (index, member) in slice.array_iter()?.enumerate() {
        let member = member?;
        if f(member, index as u64) {
            builder.add_slice(member)?;
        }
    }
    builder.close()?;
    Ok(builder)
}

/// New array with each member replaced by `f`'s result.
pub fn map<'a, F>(slice: Slice<'a>, mut f: F) -> Result<Builder>
where
    F: FnMut(Slice<'a>, u64) -> Value<'a>,
{
    let mut builder = Builder::new();
    builder.open_array()?;
    for (index, member) in slice.array_iter()?.enumerate() {
        let value = f(member?, index as u64);
        builder.add(value)?;
    }
    builder.close()?;
    Ok(builder)
}

/// First member for which `f` returns `true`.
pub fn find<'a, F>(slice: Slice<'a>, mut f: F) -> Result<Option<Slice<'a>>>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    for (index, member) in slice.array_iter()?.enumerate() {
        let member = member?;
        if f(member, index as u64) {
            return Ok(Some(member));
        }
    }
    Ok(None)
}

/// Whether any member satisfies `f`; `false` on the empty array.
pub fn any<'a, F>(slice: Slice<'a>, f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    Ok(find(slice, f)?.is_some())
}

/// Whether some member satisfies `f`, short-circuiting on the first hit.
pub fn contains<'a, F>(slice: Slice<'a>, f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    any(slice, f)
}

/// Whether every member satisfies `f`; `true` on the empty array.
pub fn all<'a, F>(slice: Slice<'a>, mut f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    for (index, member) in slice.array_iter()?.enumerate() {
        if !f(member?, index as u64) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// New object containing only the attributes named in `names`, preserving
/// source order.
pub fn keep<S: AsRef<str>>(slice: Slice<'_>, names: &[S]) -> Result<Builder> {
    retain(slice, names, true)
}

/// New object without the attributes named in `names`.
pub fn remove<S: AsRef<str>>(slice: Slice<'_>, names: &[S]) -> Result<Builder> {
    retain(slice, names, false)
}

fn retain<S: AsRef<str>>(slice: Slice<'_>, names: &[S], keep_named: bool) -> Result<Builder> {
    let set: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
    let mut builder = Builder::new();
    builder.open_object()?;
    for entry in slice.object_iter()? {
        let (key, value) = entry?;
        if set.contains(key.get_string()?) == keep_named {
            builder.add_slice(key)?;
            builder.add_slice(value)?;
        }
    }
    builder.close()?;
    Ok(builder)
}

/// Merges two objects; attributes of `right` override `left`. With
/// `recursive`, object values present on both sides are merged instead of
/// replaced. With `null_means_remove`, a null on the right omits the
/// attribute from the result.
pub fn merge(
    left: Slice<'_>,
    right: Slice<'_>,
    recursive: bool,
    null_means_remove: bool,
) -> Result<Builder> {
    if !left.is_object() {
        return Err(Error::invalid_type(left.value_type(), "Object"));
    }
    if !right.is_object() {
        return Err(Error::invalid_type(right.value_type(), "Object"));
    }
    let mut builder = Builder::new();
    builder.open_object()?;

    for entry in left.object_iter()? {
        let (key, left_value) = entry?;
        let name = key.get_string()?;
        match right.get(name)? {
            Some(right_value) => {
                if null_means_remove && right_value.is_null() {
                    continue;
                }
                if recursive && left_value.is_object() && right_value.is_object() {
                    let sub = merge(left_value, right_value, true, null_means_remove)?;
                    builder.add_slice(key)?;
                    builder.add_slice(sub.slice()?)?;
                } else {
                    builder.add_slice(key)?;
                    builder.add_slice(right_value)?;
                }
            }
            None => {
                builder.add_slice(key)?;
                builder.add_slice(left_value)?;
            }
        }
    }

    for entry in right.object_iter()? {
        let (key, right_value) = entry?;
        let name = key.get_string()?;
        if left.get(name)?.is_some() {
            continue;
        }
        if null_means_remove && right_value.is_null() {
            continue;
        }
        builder.add_slice(key)?;
        builder.add_slice(right_value)?;
    }

    builder.close()?;
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn parse(json: &str) -> Builder {
        Parser::from_json(json).unwrap()
    }

    fn parse_unsorted(json: &str) -> Builder {
        let options = crate::Options {
            sort_attribute_names: false,
            ..crate::Options::default()
        };
        Parser::from_json_with_options(json, options).unwrap()
    }

    #[test]
    fn keys_non_object() {
        let b = parse("null");
        assert!(matches!(
            keys(b.slice().unwrap()),
            Err(Error::InvalidValueType { .. })
        ));

        let b = parse("[]");
        assert!(matches!(
            keys(b.slice().unwrap()),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn keys_sorted_object() {
        let b = parse("{\"foo\":1,\"bar\":2,\"baz\":3}");
        assert_eq!(keys(b.slice().unwrap()).unwrap(), vec!["bar", "baz", "foo"]);
    }

    #[test]
    fn keys_unsorted_object() {
        let b = parse_unsorted("{\"foo\":1,\"bar\":2,\"baz\":3}");
        assert_eq!(keys(b.slice().unwrap()).unwrap(), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn values_non_object() {
        for json in ["null", "\"foobar\"", "[]"] {
            let b = parse(json);
            assert!(matches!(
                values(b.slice().unwrap()),
                Err(Error::InvalidValueType { .. })
            ));
        }
    }

    #[test]
    fn values_in_storage_order() {
        let b = parse(
            "{\"1foo\":\"bar\",\"2baz\":\"quux\",\"3number\":1,\"4boolean\":true,\"5empty\":null}",
        );
        let vals = values(b.slice().unwrap()).unwrap();
        let s = vals.slice().unwrap();
        assert!(s.is_array());
        assert_eq!(s.length().unwrap(), 5);
        assert_eq!(s.at(0).unwrap().get_string().unwrap(), "bar");
        assert_eq!(s.at(1).unwrap().get_string().unwrap(), "quux");
        assert_eq!(s.at(2).unwrap().get_uint().unwrap(), 1);
        assert!(s.at(3).unwrap().get_bool().unwrap());
        assert!(s.at(4).unwrap().is_null());
    }

    #[test]
    fn for_each_non_array() {
        let b = parse("null");
        assert!(matches!(
            for_each(b.slice().unwrap(), |_, _| false),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn for_each_empty_array_never_calls_back() {
        let b = parse("[]");
        for_each(b.slice().unwrap(), |_, _| {
            panic!("callback must not run");
        })
        .unwrap();
    }

    #[test]
    fn for_each_visits_in_order() {
        let b = parse("[1,2,3,\"foo\",\"bar\"]");
        let mut seen = 0u64;
        for_each(b.slice().unwrap(), |member, index| {
            assert_eq!(seen, index);
            if seen < 3 {
                assert!(member.is_number());
            } else {
                assert!(member.is_string());
            }
            seen += 1;
            true
        })
        .unwrap();
        assert_eq!(seen, 5);
    }

    #[test]
    fn for_each_stops_on_false() {
        let b = parse("[1,2,3,\"foo\",\"bar\"]");
        let mut seen = 0u64;
        for_each(b.slice().unwrap(), |_, _| {
            if seen == 3 {
                return false;
            }
            seen += 1;
            true
        })
        .unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn filter_non_array() {
        let b = parse("null");
        assert!(matches!(
            filter(b.slice().unwrap(), |_, _| false),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn filter_all_out() {
        let b = parse("[1,2,3,4,-42,19]");
        let result = filter(b.slice().unwrap(), |_, _| false).unwrap();
        let s = result.slice().unwrap();
        assert!(s.is_array());
        assert_eq!(s.length().unwrap(), 0);
    }

    #[test]
    fn filter_by_index() {
        let b = parse("[1,2,3,4,-42,19]");
        let mut seen = 0u64;
        let result = filter(b.slice().unwrap(), |member, index| {
            assert_eq!(seen, index);
            assert!(member.is_number());
            seen += 1;
            index != 4
        })
        .unwrap();
        assert_eq!(seen, 6);

        let s = result.slice().unwrap();
        assert_eq!(s.length().unwrap(), 5);
        let got: Vec<i64> = (0..5).map(|i| s.at(i).unwrap().get_int().unwrap()).collect();
        assert_eq!(got, vec![1, 2, 3, 4, 19]);
    }

    #[test]
    fn map_array() {
        let b = parse("[1,2,3,4,-42,19]");
        let mapped = ["foo", "bar", "baz", "qux", "quetzalcoatl", ""];
        let mut seen = 0u64;
        let result = map(b.slice().unwrap(), |member, index| {
            assert_eq!(seen, index);
            assert!(member.is_number());
            seen += 1;
            Value::from(mapped[index as usize])
        })
        .unwrap();
        assert_eq!(seen, 6);

        let s = result.slice().unwrap();
        assert_eq!(s.length().unwrap(), 6);
        for (i, expected) in mapped.iter().enumerate() {
            assert_eq!(s.at(i as u64).unwrap().get_string().unwrap(), *expected);
        }
    }

    #[test]
    fn find_in_array() {
        let b = parse("[1,2,3]");
        let s = b.slice().unwrap();

        assert!(find(s, |_, _| false).unwrap().is_none());

        let mut seen = 0;
        let found = find(s, |_, _| {
            seen += 1;
            true
        })
        .unwrap();
        assert_eq!(seen, 1);
        assert_eq!(found.unwrap().get_uint().unwrap(), 1);

        let mut seen = 0;
        let found = find(s, |_, index| {
            seen += 1;
            index == 2
        })
        .unwrap();
        assert_eq!(seen, 3);
        assert_eq!(found.unwrap().get_uint().unwrap(), 3);
    }

    #[test]
    fn contains_and_any() {
        let b = parse("[]");
        assert!(!contains(b.slice().unwrap(), |_, _| true).unwrap());
        assert!(!any(b.slice().unwrap(), |_, _| true).unwrap());

        let b = parse("[1,2,3,4]");
        let s = b.slice().unwrap();
        assert!(!contains(s, |_, _| false).unwrap());

        let mut seen = 0;
        assert!(any(s, |_, index| {
            seen += 1;
            index == 3
        })
        .unwrap());
        assert_eq!(seen, 4);

        let mut seen = 0;
        assert!(contains(s, |_, _| {
            seen += 1;
            true
        })
        .unwrap());
        assert_eq!(seen, 1);
    }

    #[test]
    fn all_semantics() {
        let b = parse("[]");
        assert!(all(b.slice().unwrap(), |_, _| false).unwrap());

        let b = parse("[1,2,3,4]");
        let s = b.slice().unwrap();

        let mut seen = 0;
        assert!(!all(s, |_, index| {
            assert_eq!(seen, index);
            seen += 1;
            false
        })
        .unwrap());
        assert_eq!(seen, 1);

        let mut seen = 0;
        assert!(!all(s, |_, index| {
            seen += 1;
            index != 2
        })
        .unwrap());
        assert_eq!(seen, 3);

        let mut seen = 0;
        assert!(all(s, |_, _| {
            seen += 1;
            true
        })
        .unwrap());
        assert_eq!(seen, 4);
    }

    #[test]
    fn non_array_predicates_fail() {
        let b = parse("null");
        let s = b.slice().unwrap();
        assert!(matches!(find(s, |_, _| true), Err(Error::InvalidValueType { .. })));
        assert!(matches!(
            contains(s, |_, _| true),
            Err(Error::InvalidValueType { .. })
        ));
        assert!(matches!(any(s, |_, _| true), Err(Error::InvalidValueType { .. })));
        assert!(matches!(all(s, |_, _| true), Err(Error::InvalidValueType { .. })));
    }

    #[test]
    fn keep_non_object() {
        let b = parse("[]");
        assert!(matches!(
            keep(b.slice().unwrap(), &["foo", "bar"]),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn keep_attributes() {
        let json = "{\"foo\":\"bar\",\"baz\":\"quux\",\"number\":1,\"boolean\":true,\"empty\":null}";
        let b = parse(json);

        let kept = keep(b.slice().unwrap(), &["foo", "baz", "empty"]).unwrap();
        let s = kept.slice().unwrap();
        assert!(s.is_object());
        assert_eq!(s.length().unwrap(), 3);
        assert_eq!(s.get("foo").unwrap().unwrap().get_string().unwrap(), "bar");
        assert_eq!(s.get("baz").unwrap().unwrap().get_string().unwrap(), "quux");
        assert!(s.get("empty").unwrap().unwrap().is_null());
        assert!(!s.has_key("number").unwrap());
        assert!(!s.has_key("boolean").unwrap());

        let none = keep(b.slice().unwrap(), &[] as &[&str]).unwrap();
        assert_eq!(none.slice().unwrap().length().unwrap(), 0);

        let missing = keep(b.slice().unwrap(), &["boo", "far", "empty"]).unwrap();
        let s = missing.slice().unwrap();
        assert_eq!(s.length().unwrap(), 1);
        assert!(s.get("empty").unwrap().unwrap().is_null());
    }

    #[test]
    fn keep_is_idempotent() {
        let json = "{\"foo\":\"bar\",\"baz\":\"quux\",\"number\":1}";
        let b = parse(json);
        let names = ["foo", "number"];
        let once = keep(b.slice().unwrap(), &names).unwrap();
        let twice = keep(once.slice().unwrap(), &names).unwrap();
        assert_eq!(once.slice().unwrap(), twice.slice().unwrap());
    }

    #[test]
    fn remove_attributes() {
        let json = "{\"foo\":\"bar\",\"baz\":\"quux\",\"number\":1,\"boolean\":true,\"empty\":null}";
        let b = parse(json);

        let removed = remove(b.slice().unwrap(), &["foo", "baz", "empty"]).unwrap();
        let s = removed.slice().unwrap();
        assert_eq!(s.length().unwrap(), 2);
        assert!(!s.has_key("foo").unwrap());
        assert_eq!(s.get("number").unwrap().unwrap().get_uint().unwrap(), 1);
        assert!(s.get("boolean").unwrap().unwrap().get_bool().unwrap());

        let untouched = remove(b.slice().unwrap(), &[] as &[&str]).unwrap();
        assert_eq!(untouched.slice().unwrap().length().unwrap(), 5);

        let b2 = remove(b.slice().unwrap(), &["boo", "far", "empty"]).unwrap();
        let s = b2.slice().unwrap();
        assert_eq!(s.length().unwrap(), 4);
        assert!(!s.has_key("empty").unwrap());
    }

    #[test]
    fn remove_non_object() {
        let b = parse("[]");
        assert!(matches!(
            remove(b.slice().unwrap(), &["foo"]),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn merge_non_objects() {
        let arr = parse("[]");
        let obj = parse("{}");
        assert!(matches!(
            merge(arr.slice().unwrap(), arr.slice().unwrap(), false, false),
            Err(Error::InvalidValueType { .. })
        ));
        assert!(matches!(
            merge(arr.slice().unwrap(), obj.slice().unwrap(), false, false),
            Err(Error::InvalidValueType { .. })
        ));
        assert!(matches!(
            merge(obj.slice().unwrap(), arr.slice().unwrap(), false, false),
            Err(Error::InvalidValueType { .. })
        ));
    }

    #[test]
    fn merge_with_empty_side() {
        let empty = parse("{}");
        let full = parse("{\"bark\":1,\"qux\":2,\"bart\":3}");

        for (l, r) in [(&empty, &full), (&full, &empty)] {
            let merged = merge(l.slice().unwrap(), r.slice().unwrap(), true, false).unwrap();
            let s = merged.slice().unwrap();
            assert_eq!(s.get("bark").unwrap().unwrap().get_uint().unwrap(), 1);
            assert_eq!(s.get("qux").unwrap().unwrap().get_uint().unwrap(), 2);
            assert_eq!(s.get("bart").unwrap().unwrap().get_uint().unwrap(), 3);
            assert_eq!(s.length().unwrap(), 3);
        }
    }

    #[test]
    fn merge_distinct_and_overlapping() {
        let l = parse("{\"foo\":1,\"bar\":2,\"baz\":3}");
        let r = parse("{\"bark\":1,\"qux\":2,\"bart\":3}");
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), true, false).unwrap();
        let s = merged.slice().unwrap();
        assert_eq!(s.length().unwrap(), 6);
        assert_eq!(s.get("foo").unwrap().unwrap().get_uint().unwrap(), 1);
        assert_eq!(s.get("bart").unwrap().unwrap().get_uint().unwrap(), 3);

        let l = parse("{\"foo\":1,\"bar\":2,\"baz\":3}");
        let r = parse("{\"baz\":19,\"bark\":1,\"qux\":2,\"bar\":42,\"test\":9,\"foo\":12}");
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), true, false).unwrap();
        let s = merged.slice().unwrap();
        assert_eq!(s.get("foo").unwrap().unwrap().get_uint().unwrap(), 12);
        assert_eq!(s.get("bar").unwrap().unwrap().get_uint().unwrap(), 42);
        assert_eq!(s.get("baz").unwrap().unwrap().get_uint().unwrap(), 19);
        assert_eq!(s.get("test").unwrap().unwrap().get_uint().unwrap(), 9);
    }

    #[test]
    fn merge_sub_attributes_recursive() {
        let l = parse("{\"foo\":1,\"bar\":{\"one\":1,\"two\":2,\"three\":3},\"baz\":{\"bird\":9},\"test\":1}");
        let r = parse("{\"foo\":2,\"bar\":{\"one\":23,\"two\":42,\"four\":99},\"baz\":{\"test\":1,\"bart\":2}}");
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), true, false).unwrap();
        let s = merged.slice().unwrap();

        assert_eq!(s.get("foo").unwrap().unwrap().get_uint().unwrap(), 2);
        let bar = s.get("bar").unwrap().unwrap();
        assert_eq!(bar.get("one").unwrap().unwrap().get_uint().unwrap(), 23);
        assert_eq!(bar.get("two").unwrap().unwrap().get_uint().unwrap(), 42);
        assert_eq!(bar.get("three").unwrap().unwrap().get_uint().unwrap(), 3);
        assert_eq!(bar.get("four").unwrap().unwrap().get_uint().unwrap(), 99);
        let baz = s.get("baz").unwrap().unwrap();
        assert_eq!(baz.length().unwrap(), 3);
        assert_eq!(baz.get("bird").unwrap().unwrap().get_uint().unwrap(), 9);
        assert_eq!(baz.get("test").unwrap().unwrap().get_uint().unwrap(), 1);
        assert_eq!(s.get("test").unwrap().unwrap().get_uint().unwrap(), 1);
    }

    #[test]
    fn merge_sub_attributes_replacing() {
        let l = parse("{\"foo\":1,\"bar\":{\"one\":1,\"two\":2,\"three\":3},\"baz\":{\"bird\":9},\"test\":1}");
        let r = parse("{\"foo\":2,\"bar\":{\"one\":23,\"two\":42,\"four\":99},\"baz\":{\"test\":1,\"bart\":2}}");
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), false, false).unwrap();
        let s = merged.slice().unwrap();

        assert_eq!(s.get("foo").unwrap().unwrap().get_uint().unwrap(), 2);
        let bar = s.get("bar").unwrap().unwrap();
        assert_eq!(bar.get("one").unwrap().unwrap().get_uint().unwrap(), 23);
        assert_eq!(bar.get("two").unwrap().unwrap().get_uint().unwrap(), 42);
        assert!(!bar.has_key("three").unwrap());
        assert_eq!(bar.get("four").unwrap().unwrap().get_uint().unwrap(), 99);
        let baz = s.get("baz").unwrap().unwrap();
        assert_eq!(baz.length().unwrap(), 2);
        assert!(!baz.has_key("bird").unwrap());
        assert_eq!(baz.get("bart").unwrap().unwrap().get_uint().unwrap(), 2);
        assert_eq!(s.get("test").unwrap().unwrap().get_uint().unwrap(), 1);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let o = parse("{\"a\":1,\"b\":{\"c\":2}}");
        let empty = parse("{}");
        for recursive in [false, true] {
            let merged =
                merge(o.slice().unwrap(), empty.slice().unwrap(), recursive, false).unwrap();
            assert_eq!(merged.slice().unwrap(), o.slice().unwrap());
            let merged =
                merge(empty.slice().unwrap(), o.slice().unwrap(), recursive, false).unwrap();
            assert_eq!(merged.slice().unwrap(), o.slice().unwrap());
        }
    }

    #[test]
    fn merge_null_means_remove() {
        let l = parse("{\"keep\":1,\"drop\":2}");
        let r = parse("{\"drop\":null,\"fresh\":3,\"gone\":null}");
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), false, true).unwrap();
        let s = merged.slice().unwrap();
        assert_eq!(s.length().unwrap(), 2);
        assert_eq!(s.get("keep").unwrap().unwrap().get_uint().unwrap(), 1);
        assert_eq!(s.get("fresh").unwrap().unwrap().get_uint().unwrap(), 3);
        assert!(!s.has_key("drop").unwrap());
        assert!(!s.has_key("gone").unwrap());

        // disabled by default: the null value survives
        let merged = merge(l.slice().unwrap(), r.slice().unwrap(), false, false).unwrap();
        let s = merged.slice().unwrap();
        assert!(s.get("drop").unwrap().unwrap().is_null());
    }
}
