//! Data and layout tables
//!
//! A table with header cells is a data table: it needs a caption and its
//! headers need a scope. A table with no header structure at all is taken
//! for a layout table and marked presentational. Cells of nested tables
//! belong to the nested table only.

use super::{normalized_text, select};
use crate::{Finding, NAME_BUDGET, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

const HEADER_ROLES: &[&str] = &["columnheader", "rowheader"];

#[derive(Debug, Clone)]
pub struct TableRule {
    audit_only: bool,
}

impl TableRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();
        for table in select(&document.tree, "table")? {
            let headers = owned(&document.tree, table, "th");
            if headers.is_empty() {
                self.check_layout_table(document, table, &mut findings)?;
            } else {
                self.check_data_table(document, table, &headers, &mut findings)?;
            }
        }
        Ok(findings)
    }

    fn check_data_table(
        &self,
        document: &mut Document,
        table: NodeId,
        headers: &[NodeId],
        findings: &mut Vec<Finding>,
    ) -> RuleResult<()> {
        let tree = &document.tree;
        let described = !owned(tree, table, "caption").is_empty()
            || tree.attr_trimmed(table, "summary").is_some()
            || tree.attr_trimmed(table, "aria-describedby").is_some();
        if !described {
            findings.push(
                Finding::suggestion("Data table without caption (caption, summary or aria-describedby)")
                    .with_fix("Add a <caption> describing the table.")
                    .on(table),
            );
        }

        let bare: Vec<NodeId> = headers
            .iter()
            .copied()
            .filter(|&th| {
                !tree.has_attr(th, "scope")
                    && tree.attr_trimmed(th, "id").is_none()
                    && !tree.attr(th, "role").is_some_and(|r| HEADER_ROLES.contains(&r))
            })
            .collect();
        for th in bare {
            let name = truncate_for_display(&normalized_text(&document.tree, th), NAME_BUDGET);
            if self.audit_only {
                findings.push(
                    Finding::suggestion(format!("Table header without scope, id or role: {name}"))
                        .with_fix("Add scope=\"col\" or scope=\"row\" to the header cell.")
                        .on(th),
                );
                continue;
            }
            let scope = infer_scope(&document.tree, table, th);
            document.tree.set_attribute(th, "scope", scope)?;
            findings.push(Finding::enhancement(format!("scope=\"{scope}\" added to table header: {name}")).on(th));
        }

        let tree = &document.tree;
        if !headers.iter().any(|&th| tree.attr_trimmed(th, "id").is_some()) {
            return Ok(());
        }
        let Some(header_row) = header_row(tree, table) else {
            return Ok(());
        };
        for td in owned(tree, table, "td") {
            if tree.has_attr(td, "headers") {
                continue;
            }
            let Some(column) = tree
                .parent_element(td)
                .and_then(|row| tree.element_children(row).position(|c| c == td))
            else {
                continue;
            };
            let header = tree.element_children(header_row).nth(column);
            if header.is_some_and(|h| tree.is_tag(h, "th") && tree.attr_trimmed(h, "id").is_some()) {
                findings.push(
                    Finding::suggestion("Cell without headers attribute despite header ids")
                        .with_fix("List the ids of this cell's headers in its headers attribute.")
                        .with_severity(Severity::Info)
                        .on(td),
                );
            }
        }
        Ok(())
    }

    fn check_layout_table(&self, document: &mut Document, table: NodeId, findings: &mut Vec<Finding>) -> RuleResult<()> {
        let tree = &document.tree;
        let structured = ["thead", "tfoot", "caption"]
            .iter()
            .any(|tag| !owned(tree, table, tag).is_empty());
        if structured || tree.attr_trimmed(table, "role").is_some() {
            return Ok(());
        }
        if self.audit_only {
            findings.push(
                Finding::suggestion("Layout table without role=\"presentation\"")
                    .with_fix("Add role=\"presentation\", or use CSS layout instead of a table.")
                    .with_severity(Severity::Info)
                    .on(table),
            );
            return Ok(());
        }
        document.tree.set_attribute(table, "role", "presentation")?;
        findings.push(Finding::enhancement("role=\"presentation\" added to layout table").on(table));
        Ok(())
    }
}

/// Nearest enclosing table, not counting `node` itself
fn owning_table(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|&a| tree.is_tag(a, "table"))
}

/// Descendants of `table` with `tag` that are not inside a nested table
fn owned(tree: &DomTree, table: NodeId, tag: &str) -> Vec<NodeId> {
    tree.descendant_elements(table)
        .filter(|&d| tree.is_tag(d, tag) && owning_table(tree, d) == Some(table))
        .collect()
}

/// First row of the table's `thead`, or its first row
fn header_row(tree: &DomTree, table: NodeId) -> Option<NodeId> {
    let rows = owned(tree, table, "tr");
    rows.iter()
        .copied()
        .find(|&row| tree.parent_element(row).is_some_and(|p| tree.is_tag(p, "thead")))
        .or_else(|| rows.first().copied())
}

/// `col` inside a header row, `row` for a leading cell, `col` otherwise
fn infer_scope(tree: &DomTree, table: NodeId, th: NodeId) -> &'static str {
    let in_thead = tree
        .ancestors(th)
        .take_while(|&a| a != table)
        .any(|a| tree.is_tag(a, "thead"));
    if in_thead {
        return "col";
    }
    let Some(row) = tree.parent_element(th) else {
        return "col";
    };
    if tree.element_children(row).all(|c| tree.is_tag(c, "th")) {
        return "col";
    }
    if tree.previous_element_sibling(th).is_none() {
        return "row";
    }
    "col"
}
