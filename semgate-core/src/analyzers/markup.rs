//! Declarative-markup analyzer: elements bucketed by `key` identity or
//! tag occurrence, pop-on-match, leftovers become added/removed. Event
//! handler attributes get their own high-severity kind.

use rustc_hash::FxHashMap;

use crate::model::{MarkupAttribute, MarkupElement, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

pub struct MarkupAnalyzer;

impl Analyzer for MarkupAnalyzer {
    fn category(&self) -> Category {
        Category::Markup
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let mut head_pool: FxHashMap<String, Vec<&MarkupElement>> = FxHashMap::default();
        for element in &head.markup {
            head_pool.entry(element.identity()).or_default().push(element);
        }
        // Pop from the front so repeated identities pair in document order.
        for bucket in head_pool.values_mut() {
            bucket.reverse();
        }

        for b in &base.markup {
            match head_pool.get_mut(&b.identity()).and_then(|v| v.pop()) {
                Some(h) => compare_elements(b, h, file, &mut records),
                None => records.push(ChangeRecord::new(
                    ChangeKind::MarkupElementRemoved,
                    file,
                    b.span,
                    &b.tag,
                    format!("element `<{}>` removed", b.tag),
                )),
            }
        }

        for bucket in head_pool.values() {
            for h in bucket {
                records.push(ChangeRecord::new(
                    ChangeKind::MarkupElementAdded,
                    file,
                    h.span,
                    &h.tag,
                    format!("element `<{}>` added", h.tag),
                ));
            }
        }

        records
    }
}

fn compare_elements(
    b: &MarkupElement,
    h: &MarkupElement,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    let base_attrs: FxHashMap<&str, &MarkupAttribute> =
        b.attributes.iter().map(|a| (a.name.as_str(), a)).collect();
    let head_attrs: FxHashMap<&str, &MarkupAttribute> =
        h.attributes.iter().map(|a| (a.name.as_str(), a)).collect();

    for (name, attr) in &base_attrs {
        match head_attrs.get(name) {
            None => {
                if attr.is_handler() {
                    records.push(handler_record(h, name, "removed", file));
                } else {
                    records.push(ChangeRecord::new(
                        ChangeKind::MarkupAttributeRemoved,
                        file,
                        b.span,
                        &b.tag,
                        format!("attribute `{name}` removed from `<{}>`", b.tag),
                    ));
                }
            }
            Some(other) if other.value != attr.value => {
                if attr.is_handler() || other.is_handler() {
                    records.push(handler_record(h, name, "changed", file));
                } else {
                    records.push(
                        ChangeRecord::new(
                            ChangeKind::MarkupAttributeChanged,
                            file,
                            h.span,
                            &h.tag,
                            format!("attribute `{name}` of `<{}>` changed", h.tag),
                        )
                        .with_context(format!(
                            "{} -> {}",
                            attr.value.as_deref().unwrap_or("(bare)"),
                            other.value.as_deref().unwrap_or("(bare)")
                        )),
                    );
                }
            }
            Some(_) => {}
        }
    }

    for (name, attr) in &head_attrs {
        if !base_attrs.contains_key(name) {
            if attr.is_handler() {
                records.push(handler_record(h, name, "added", file));
            } else {
                records.push(ChangeRecord::new(
                    ChangeKind::MarkupAttributeAdded,
                    file,
                    h.span,
                    &h.tag,
                    format!("attribute `{name}` added to `<{}>`", h.tag),
                ));
            }
        }
    }
}

fn handler_record(h: &MarkupElement, name: &str, what: &str, file: &str) -> ChangeRecord {
    ChangeRecord::new(
        ChangeKind::MarkupHandlerChanged,
        file,
        h.span,
        &h.tag,
        format!("event handler `{name}` on `<{}>` {what}", h.tag),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.tsx", Dialect::Markup);
        let h = SourceModel::extract(head, "test.tsx", Dialect::Markup);
        MarkupAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn identical_markup_is_invisible() {
        let src = "const App = () => <div className=\"x\"><span>hi</span></div>;";
        assert!(diff(src, src).is_empty());
    }

    #[test]
    fn removed_element_is_reported() {
        let records = diff(
            "const App = () => <div><Badge /></div>;",
            "const App = () => <div></div>;",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::MarkupElementRemoved);
        assert_eq!(records[0].node_label, "Badge");
    }

    #[test]
    fn handler_change_is_high() {
        let records = diff(
            "const App = () => <Button onClick={save} />;",
            "const App = () => <Button onClick={saveDraft} />;",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::MarkupHandlerChanged);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn attribute_add_is_low_remove_is_medium() {
        let records = diff(
            "const App = () => <input type=\"text\" disabled />;",
            "const App = () => <input type=\"text\" placeholder=\"name\" />;",
        );
        let removed = records.iter().find(|r| r.kind == ChangeKind::MarkupAttributeRemoved).unwrap();
        let added = records.iter().find(|r| r.kind == ChangeKind::MarkupAttributeAdded).unwrap();
        assert_eq!(removed.severity, Severity::Medium);
        assert_eq!(added.severity, Severity::Low);
    }

    #[test]
    fn keyed_elements_pair_by_key() {
        let records = diff(
            "const L = () => <ul><li key=\"a\">A</li><li key=\"b\">B</li></ul>;",
            "const L = () => <ul><li key=\"b\">B</li><li key=\"a\">A</li></ul>;",
        );
        assert!(records.is_empty());
    }
}
