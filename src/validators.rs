//! Field-type and options sub-validators, invoked by the lint engine
//! for semantic descriptors.

use crate::ast::RawValue;
use crate::descriptor::{is_protocol_prefixed, Descriptor, Resource};
use crate::lint::Diagnostics;

const FIELD_TYPES: &[&str] = &[
    "text",
    "search",
    "email",
    "tel",
    "url",
    "datetime",
    "date",
    "time",
    "month",
    "week",
    "datetime-local",
    "number",
    "boolean",
    "select",
];

const VALIDATOR_TYPES: &[&str] = &["required", "pattern", "maxlength", "min", "max"];

const DATE_AND_NUMBER_TYPES: &[&str] = &[
    "datetime",
    "date",
    "time",
    "month",
    "week",
    "datetime-local",
    "number",
];

// The field types each validator may be attached to.
fn allowed_field_types(validator: &str) -> &'static [&'static str] {
    match validator {
        "pattern" => &["text", "search", "email", "tel", "url"],
        "maxlength" => &["text", "url"],
        "min" | "max" => DATE_AND_NUMBER_TYPES,
        "required" => FIELD_TYPES,
        _ => &[],
    }
}

/// Checks a semantic descriptor's `field_type` against the supported
/// set, and each of its `validators` keys for existence and
/// field-type compatibility.
pub(crate) fn validate_field_type(descriptor: &Descriptor, diagnostics: &mut Diagnostics) {
    let Some(field_type) = descriptor.field_type() else {
        return;
    };

    if !FIELD_TYPES.contains(&field_type) {
        diagnostics.add_error(
            "descriptors.invalid_field_type",
            vec![
                ("id", descriptor.id().to_string()),
                ("field_type", field_type.to_string()),
            ],
        );
        return;
    }

    let Some(validators) = descriptor.validators() else {
        return;
    };
    for validator in validators.keys() {
        if !VALIDATOR_TYPES.contains(&validator) {
            diagnostics.add_error(
                "descriptors.invalid_field_validator",
                vec![
                    ("id", descriptor.id().to_string()),
                    ("field_type", field_type.to_string()),
                    ("validator", validator.to_string()),
                ],
            );
        } else if !allowed_field_types(validator).contains(&field_type) {
            diagnostics.add_error(
                "descriptors.not_permitted_field_validator",
                vec![
                    ("id", descriptor.id().to_string()),
                    ("field_type", field_type.to_string()),
                    ("validator", validator.to_string()),
                ],
            );
        }
    }
}

const OPTIONS_KEYS: &[&str] = &[
    "id",
    "href",
    "list",
    "hash",
    "external_list",
    "external_hash",
    "value_attribute_name",
    "text_attribute_name",
    "source",
    "datalist",
];

// The mutually exclusive enumerator forms.
const ENUMERATOR_KEYS: &[&str] = &["href", "list", "hash", "external_list", "external_hash"];

const VALUE_REQUIRED_KEYS: &[&str] = &["id", "href", "list", "hash", "external_list", "external_hash"];

/// Checks a descriptor's `options` mapping: known keys, a single
/// enumerator form, and the per-form value rules.
pub(crate) fn validate_options(
    resource: &Resource,
    descriptor: &Descriptor,
    diagnostics: &mut Diagnostics,
) {
    let Some(options) = descriptor.options() else {
        return;
    };
    let id_context = || ("id", descriptor.id().to_string());

    for key in options.keys() {
        if !OPTIONS_KEYS.contains(&key) {
            diagnostics.add_error(
                "descriptors.invalid_options_attribute",
                vec![id_context(), ("options_attr", key.to_string())],
            );
        }
    }

    let enumerators: Vec<&str> = options
        .keys()
        .filter(|key| ENUMERATOR_KEYS.contains(key))
        .collect();
    if enumerators.len() > 1 {
        diagnostics.add_error(
            "descriptors.multiple_options",
            vec![id_context(), ("options_keys", enumerators.join(", "))],
        );
    }

    for (key, value) in options.iter() {
        if VALUE_REQUIRED_KEYS.contains(&key) && value.is_empty_value() {
            diagnostics.add_error(
                "descriptors.missing_options_value",
                vec![id_context(), ("options_attr", key.to_string())],
            );
        }

        match key {
            "list" => {
                if value.as_mapping().is_some() {
                    diagnostics.add_error(
                        "descriptors.invalid_option_enumerator",
                        vec![
                            id_context(),
                            ("key_type", key.to_string()),
                            ("value_type", "hash".to_string()),
                        ],
                    );
                }
            }
            "hash" => hash_option_check(descriptor, value, diagnostics),
            "href" => {
                if let Some(href) = value.as_str().filter(|href| !href.is_empty()) {
                    href_option_check(resource, descriptor, href, diagnostics);
                }
            }
            "external_list" | "external_hash" => {
                if !value.is_empty_value() {
                    external_option_check(descriptor, key, value, options.contains("value_attribute_name"), diagnostics);
                }
            }
            "value_attribute_name" | "text_attribute_name" => {
                if value.is_empty_value() {
                    diagnostics.add_warning(
                        "descriptors.missing_options_value",
                        vec![id_context(), ("options_attr", key.to_string())],
                    );
                }
            }
            "source" => source_option_check(descriptor, value, diagnostics),
            "datalist" => datalist_check(resource, descriptor, value, diagnostics),
            _ => {}
        }
    }
}

fn hash_option_check(descriptor: &Descriptor, value: &RawValue, diagnostics: &mut Diagnostics) {
    match value {
        RawValue::Sequence(_) => diagnostics.add_error(
            "descriptors.invalid_option_enumerator",
            vec![
                ("id", descriptor.id().to_string()),
                ("key_type", "hash".to_string()),
                ("value_type", "list".to_string()),
            ],
        ),
        RawValue::Mapping(map) => {
            if map.iter().any(|(_, v)| v.is_empty_value()) {
                diagnostics.add_warning(
                    "descriptors.missing_options_value",
                    vec![
                        ("id", descriptor.id().to_string()),
                        ("options_attr", "hash".to_string()),
                    ],
                );
            }
        }
        _ => {}
    }
}

// An href option either points at `resource#option-id` inside this
// document, or at an external profile by protocol URI.
fn href_option_check(
    resource: &Resource,
    descriptor: &Descriptor,
    href: &str,
    diagnostics: &mut Diagnostics,
) {
    let id_context = || ("id", descriptor.id().to_string());

    if href.contains('#') {
        let segments: Vec<&str> = href.split('#').collect();
        if segments.len() != 2 || segments.iter().any(|segment| segment.is_empty()) {
            diagnostics.add_warning(
                "descriptors.invalid_options_ref",
                vec![
                    id_context(),
                    ("options_attr", "href".to_string()),
                    ("ref", href.to_string()),
                ],
            );
        }

        let lhs = segments.first().copied().unwrap_or_default();
        if !descriptor_id_exists(resource, lhs) {
            diagnostics.add_error(
                "descriptors.option_reference_not_found",
                vec![
                    id_context(),
                    ("options_attr", "href".to_string()),
                    ("ref", href.to_string()),
                    ("type", "descriptor".to_string()),
                ],
            );
        }

        let rhs = segments.last().copied().unwrap_or_default();
        if !options_id_exists(resource.descriptors(), rhs) {
            diagnostics.add_error(
                "descriptors.option_reference_not_found",
                vec![
                    id_context(),
                    ("options_attr", "href".to_string()),
                    ("ref", href.to_string()),
                    ("type", "option id".to_string()),
                ],
            );
        }
    } else if !is_protocol_prefixed(href) {
        diagnostics.add_error(
            "descriptors.invalid_options_protocol",
            vec![
                id_context(),
                ("options_attr", "href".to_string()),
                ("uri", href.to_string()),
            ],
        );
    }
}

fn descriptor_id_exists(resource: &Resource, id: &str) -> bool {
    fn search(descriptors: &[Descriptor], id: &str) -> bool {
        descriptors.iter().any(|descriptor| {
            descriptor.id().eq_ignore_ascii_case(id) || search(descriptor.child_slice(), id)
        })
    }
    search(resource.descriptors(), id)
}

// An option id is reachable anywhere in the descriptor tree.
fn options_id_exists(descriptors: &[Descriptor], option_id: &str) -> bool {
    descriptors.iter().any(|descriptor| {
        descriptor
            .options()
            .and_then(|options| options.get_str("id"))
            .is_some_and(|id| id == option_id)
            || options_id_exists(descriptor.child_slice(), option_id)
    })
}

fn external_option_check(
    descriptor: &Descriptor,
    key: &str,
    value: &RawValue,
    has_value_attribute: bool,
    diagnostics: &mut Diagnostics,
) {
    let id_context = || ("id", descriptor.id().to_string());

    if !value.as_str().is_some_and(is_protocol_prefixed) {
        diagnostics.add_error(
            "descriptors.invalid_option_protocol",
            vec![
                id_context(),
                ("options_attr", key.to_string()),
                ("uri", value.render()),
            ],
        );
    }

    if !has_value_attribute {
        diagnostics.add_error(
            "descriptors.missing_options_key",
            vec![id_context(), ("options_attr", key.to_string())],
        );
    }
}

fn source_option_check(descriptor: &Descriptor, value: &RawValue, diagnostics: &mut Diagnostics) {
    let id_context = || ("id", descriptor.id().to_string());

    if value.is_empty_value() {
        diagnostics.add_error(
            "descriptors.missing_options_value",
            vec![id_context(), ("options_attr", "source".to_string())],
        );
    } else if value.as_str().is_none() {
        diagnostics.add_error(
            "descriptors.invalid_option_source_type",
            vec![id_context(), ("options_attr", "source".to_string())],
        );
    }
}

fn datalist_check(
    resource: &Resource,
    descriptor: &Descriptor,
    value: &RawValue,
    diagnostics: &mut Diagnostics,
) {
    let id_context = || ("id", descriptor.id().to_string());

    if value.is_empty_value() {
        diagnostics.add_error(
            "descriptors.missing_option_datalist_value",
            vec![id_context(), ("options_attr", "datalist".to_string())],
        );
    } else if let Some(datalist) = value.as_str() {
        if !resource.has_datalist(datalist) {
            diagnostics.add_error(
                "descriptors.invalid_option_datalist",
                vec![
                    id_context(),
                    ("options_attr", "datalist".to_string()),
                    ("datalist", datalist.to_string()),
                ],
            );
        }
    }
}
