//! Forms
//!
//! Associates nearby labels with their controls, mirrors `required` and
//! framework error classes into ARIA state, and audits the rest: unlabeled
//! fields, radio groups without a group label, contact fields without
//! autocomplete hints and unlabeled option groups.

use super::{field_name, has_value, normalized_text, select};
use crate::{DISPLAY_BUDGET, Finding, NAME_BUDGET, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

const FORM_CONTROL_SELECTOR: &str = "input:not([type=\"hidden\"]):not([type=\"submit\"]):not([type=\"button\"]):not([type=\"reset\"]):not([type=\"image\"]), select, textarea";

/// Class fragments frameworks use to flag a field in error
const ERROR_CLASS_PATTERNS: &[&str] = &[
    "error",
    "invalid",
    "is-invalid",
    "has-error",
    "field-error",
    "form-error",
    "ng-invalid",
    "is-error",
];

const GENERATED_ID_PREFIX: &str = "lumen-field";

#[derive(Debug, Clone)]
pub struct FormRule {
    audit_only: bool,
}

impl FormRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();
        self.associate_labels(document, &mut findings)?;
        self.mirror_required(document, &mut findings)?;
        self.mirror_invalid(document, &mut findings)?;
        audit_unlabeled_fields(&document.tree, &mut findings)?;
        audit_radio_groups(&document.tree, &mut findings)?;
        audit_autocomplete(&document.tree, &mut findings)?;
        audit_optgroups(&document.tree, &mut findings)?;
        Ok(findings)
    }

    fn associate_labels(&self, document: &mut Document, findings: &mut Vec<Finding>) -> RuleResult<()> {
        for control in select(&document.tree, FORM_CONTROL_SELECTOR)? {
            let tree = &document.tree;
            let control_id = tree.attr_trimmed(control, "id").map(str::to_string);
            if control_id.as_deref().is_some_and(|id| label_for(tree, id).is_some()) {
                continue;
            }
            let Some(label) = find_associated_label(tree, control) else {
                continue;
            };
            let current_for = tree.attr_trimmed(label, "for").map(str::to_string);
            if let Some(target) = &current_for {
                let points_elsewhere = Some(target) != control_id.as_ref();
                if points_elsewhere && document.get_element_by_id(target).is_some() {
                    continue;
                }
            }

            let label_text = normalized_text(tree, label);
            let shown = if label_text.is_empty() {
                "Field".to_string()
            } else {
                truncate_for_display(&label_text, DISPLAY_BUDGET)
            };

            if self.audit_only {
                let implicit = tree.parent_element(control).is_some_and(|p| tree.is_tag(p, "label"));
                if !implicit {
                    findings.push(
                        Finding::suggestion(format!("Label not associated: {shown}"))
                            .with_fix("Point the label's for attribute at the control's id.")
                            .on(control),
                    );
                }
                continue;
            }

            let id = match control_id {
                Some(id) => id,
                None => {
                    let id = document.unique_id(GENERATED_ID_PREFIX);
                    document.tree.set_attribute(control, "id", &id)?;
                    id
                }
            };
            if current_for.as_deref() != Some(id.as_str()) {
                document.tree.set_attribute(label, "for", &id)?;
                findings.push(
                    Finding::enhancement(format!("Label associated: {shown}"))
                        .with_description("The label's for attribute now points at the control's id.")
                        .on(control),
                );
            }
        }
        Ok(())
    }

    fn mirror_required(&self, document: &mut Document, findings: &mut Vec<Finding>) -> RuleResult<()> {
        let controls: Vec<NodeId> = select(&document.tree, FORM_CONTROL_SELECTOR)?
            .into_iter()
            .filter(|&c| document.tree.has_attr(c, "required"))
            .filter(|&c| document.tree.attr(c, "aria-required") != Some("true"))
            .collect();

        for control in controls {
            let name = truncate_for_display(&field_name(&document.tree, control), NAME_BUDGET);
            if self.audit_only {
                findings.push(
                    Finding::suggestion(format!("Required field without aria-required: {name}"))
                        .with_fix("Add aria-required=\"true\".")
                        .with_severity(Severity::Info)
                        .on(control),
                );
                continue;
            }
            document.tree.set_attribute(control, "aria-required", "true")?;
            findings.push(Finding::enhancement(format!("aria-required added: {name}")).on(control));
        }
        Ok(())
    }

    /// The one place a rule removes an attribute: `aria-invalid` follows the
    /// error classes both ways.
    fn mirror_invalid(&self, document: &mut Document, findings: &mut Vec<Finding>) -> RuleResult<()> {
        for control in select(&document.tree, FORM_CONTROL_SELECTOR)? {
            let has_error = has_error_state(&document.tree, control);
            let marked = document.tree.attr(control, "aria-invalid") == Some("true");
            let name = truncate_for_display(&field_name(&document.tree, control), NAME_BUDGET);

            if has_error && !marked {
                if self.audit_only {
                    findings.push(
                        Finding::suggestion(format!("Field in error without aria-invalid: {name}"))
                            .with_fix("Add aria-invalid=\"true\" while the field is in error.")
                            .on(control),
                    );
                } else {
                    document.tree.set_attribute(control, "aria-invalid", "true")?;
                    findings.push(
                        Finding::enhancement(format!("aria-invalid added (error detected): {name}")).on(control),
                    );
                }
            } else if !has_error && marked && !self.audit_only {
                document.tree.remove_attribute(control, "aria-invalid")?;
                tracing::debug!("Cleared stale aria-invalid on {}", control);
            }
        }
        Ok(())
    }
}

fn label_for(tree: &DomTree, id: &str) -> Option<NodeId> {
    tree.descendant_elements(NodeId::ROOT)
        .filter(|&n| tree.is_tag(n, "label"))
        .find(|&label| tree.attr(label, "for") == Some(id))
}

fn first_label_in(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    tree.descendant_elements(node).find(|&d| tree.is_tag(d, "label"))
}

/// Nearest label by structure, in this order: a wrapping label, the
/// previous sibling, a direct label child of the parent, then labels inside
/// earlier siblings while those siblings are `div`, `span` or `p` wrappers.
fn find_associated_label(tree: &DomTree, control: NodeId) -> Option<NodeId> {
    let parent = tree.parent_element(control)?;
    if tree.is_tag(parent, "label") {
        return Some(parent);
    }

    let previous = tree.previous_element_sibling(control);
    if let Some(prev) = previous.filter(|&p| tree.is_tag(p, "label")) {
        return Some(prev);
    }

    if let Some(label) = tree.element_children(parent).find(|&c| tree.is_tag(c, "label")) {
        return Some(label);
    }

    let mut sibling = previous;
    while let Some(current) = sibling {
        let label = if tree.is_tag(current, "label") {
            Some(current)
        } else {
            first_label_in(tree, current)
        };
        if label.is_some() {
            return label;
        }
        let wrapper = ["div", "span", "p"].iter().any(|t| tree.is_tag(current, t));
        if !wrapper {
            break;
        }
        sibling = tree.previous_element_sibling(current);
    }
    None
}

fn has_error_class(tree: &DomTree, node: NodeId) -> bool {
    tree.element(node).is_some_and(|elem| {
        elem.classes().any(|class| {
            let class = class.to_lowercase();
            ERROR_CLASS_PATTERNS.iter().any(|p| class.contains(p))
        })
    })
}

/// Error class on the control, its parent or its grandparent
fn has_error_state(tree: &DomTree, control: NodeId) -> bool {
    std::iter::once(control)
        .chain(tree.ancestors(control).filter(|&a| tree.element(a).is_some()).take(2))
        .any(|node| has_error_class(tree, node))
}

fn audit_unlabeled_fields(tree: &DomTree, findings: &mut Vec<Finding>) -> RuleResult<()> {
    for control in select(tree, FORM_CONTROL_SELECTOR)? {
        let explicit = tree
            .attr_trimmed(control, "id")
            .is_some_and(|id| label_for(tree, id).is_some());
        let labelled = explicit
            || find_associated_label(tree, control).is_some()
            || ["aria-label", "aria-labelledby", "title"].iter().any(|a| has_value(tree, control, a));
        if !labelled {
            let name = truncate_for_display(&field_name(tree, control), NAME_BUDGET);
            findings.push(
                Finding::suggestion(format!("Field without label: {name}"))
                    .with_fix("Add a <label for=\"…\">, an aria-label or an aria-labelledby.")
                    .with_severity(Severity::Error)
                    .on(control),
            );
        }
    }
    Ok(())
}

fn audit_radio_groups(tree: &DomTree, findings: &mut Vec<Finding>) -> RuleResult<()> {
    let radios = select(tree, "input[type=radio]")?;
    let mut seen: Vec<&str> = Vec::new();
    let fieldset = lumen_dom::Selector::parse("fieldset")?;
    let group = lumen_dom::Selector::parse("[role=group]")?;
    let radiogroup = lumen_dom::Selector::parse("[role=radiogroup]")?;

    for &radio in &radios {
        let Some(name) = tree.attr_trimmed(radio, "name") else {
            continue;
        };
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let members: Vec<NodeId> = radios
            .iter()
            .copied()
            .filter(|&r| tree.attr(r, "name").map(str::trim) == Some(name))
            .collect();
        if members.len() < 2 {
            continue;
        }
        let first = members[0];
        let set = tree.closest(first, &fieldset);
        let container = set
            .or_else(|| tree.closest(first, &group))
            .or_else(|| tree.closest(first, &radiogroup));

        let has_legend = set.is_some_and(|f| tree.descendant_elements(f).any(|d| tree.is_tag(d, "legend")));
        let has_group_label = container.is_some_and(|c| {
            has_value(tree, c, "aria-label") || has_value(tree, c, "aria-labelledby")
        });
        if !has_legend && !has_group_label {
            findings.push(
                Finding::suggestion(format!(
                    "Radio group without legend: {}",
                    truncate_for_display(name, NAME_BUDGET)
                ))
                .with_fix("Wrap the group in <fieldset> with a <legend>, or label a role=\"radiogroup\" container.")
                .on(first),
            );
        }
    }
    Ok(())
}

fn audit_autocomplete(tree: &DomTree, findings: &mut Vec<Finding>) -> RuleResult<()> {
    let fields = select(
        tree,
        "input[type=email], input[type=tel], input[name*=email i], input[name*=tel i], input[name*=name i]",
    )?;
    for input in fields {
        if tree.has_attr(input, "autocomplete") {
            continue;
        }
        let kind = tree.attr(input, "type").unwrap_or("text").to_ascii_lowercase();
        let name = tree.attr(input, "name").unwrap_or_default().to_lowercase();
        let (message, hint) = if kind == "email" || name.contains("email") {
            ("Email field without autocomplete", "email")
        } else if kind == "tel" || name.contains("tel") {
            ("Phone field without autocomplete", "tel")
        } else {
            continue;
        };
        findings.push(
            Finding::suggestion(message)
                .with_fix(format!("Add autocomplete=\"{hint}\"."))
                .with_severity(Severity::Info)
                .on(input),
        );
    }
    Ok(())
}

fn audit_optgroups(tree: &DomTree, findings: &mut Vec<Finding>) -> RuleResult<()> {
    for group in select(tree, "optgroup")? {
        if !has_value(tree, group, "label") {
            findings.push(
                Finding::suggestion("Option group without label")
                    .with_fix("Add a label attribute to the <optgroup>.")
                    .on(group),
            );
        }
    }
    Ok(())
}
