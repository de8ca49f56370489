//! The external claim mapping wizard hosted by the demo

use formwright::forms::{
    async_validator_fn, validator_fn, FieldDescriptor, FieldOption, FieldValue, FormInstance,
    Snapshot, ValidationResult, WizardCoordinator, WizardStep,
};
use formwright::{EngineConfig, FormError};
use std::time::Duration;

/// Claims the target dialect already maps
const EXISTING_CLAIMS: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname",
];

/// Local claims an external claim can be mapped to (label, URI)
const LOCAL_CLAIMS: &[(&str, &str)] = &[
    ("Email", "http://wso2.org/claims/emailaddress"),
    ("First Name", "http://wso2.org/claims/givenname"),
    ("Last Name", "http://wso2.org/claims/lastname"),
    ("Username", "http://wso2.org/claims/username"),
];

/// Button that empties the attribute flags
pub const CLEAR_FLAGS: &str = "clearFlags";

/// Simulated latency of the remote claim lookup
const LOOKUP_DELAY: Duration = Duration::from_millis(150);

pub fn build_wizard(config: &EngineConfig) -> Result<WizardCoordinator, FormError> {
    Ok(WizardCoordinator::new(vec![
        claim_step(config)?,
        attribute_step(config)?,
        summary_step(config)?,
    ]))
}

fn claim_step(config: &EngineConfig) -> Result<WizardStep, FormError> {
    let local_claims = LOCAL_CLAIMS
        .iter()
        .map(|(label, uri)| FieldOption::new(label, uri))
        .collect();

    let form = FormInstance::builder("claim")
        .config(config)
        .field(
            FieldDescriptor::text("claimURI", "External claim URI")
                .required_with("Claim URI is required")
                .with_placeholder("http://schemas.example.org/claims/email")
                .with_validator(async_validator_fn(check_claim_uri)),
        )
        .field(
            FieldDescriptor::dropdown("mappedLocalClaimURI", "Mapped local claim", local_claims)
                .required_with("Select a local claim to map to")
                .with_default(LOCAL_CLAIMS[0].1),
        )
        .field(FieldDescriptor::textarea("description", "Description"))
        .build()?;

    Ok(WizardStep::new("claim", "External claim", form))
}

fn attribute_step(config: &EngineConfig) -> Result<WizardStep, FormError> {
    let form = FormInstance::builder("attribute")
        .config(config)
        .field(
            FieldDescriptor::text("attributeName", "Attribute name")
                .required()
                .with_validator(validator_fn(check_attribute_name)),
        )
        .field(FieldDescriptor::checkbox_group(
            "flags",
            "Flags",
            vec![
                FieldOption::new("Required", "required"),
                FieldOption::new("Supported by default", "supportedByDefault"),
                FieldOption::new("Read only", "readOnly"),
            ],
        ))
        .field(
            FieldDescriptor::radio_group(
                "scope",
                "Scope",
                vec![
                    FieldOption::new("User", "user"),
                    FieldOption::new("Organization", "organization"),
                ],
            )
            .with_default("user"),
        )
        .field(FieldDescriptor::number(
            "displayOrder",
            "Display order",
            Some(0.0),
            Some(100.0),
        ))
        .field(
            FieldDescriptor::button(CLEAR_FLAGS, "Clear flags")
                .disabled_when(|values| values.get("flags").is_none_or(FieldValue::is_empty)),
        )
        .build()?;
    required_implies_supported(&form);

    Ok(WizardStep::new("attribute", "Attribute", form))
}

fn summary_step(config: &EngineConfig) -> Result<WizardStep, FormError> {
    let form = FormInstance::builder("summary")
        .config(config)
        .field(
            FieldDescriptor::checkbox_group(
                "confirm",
                "Confirmation",
                vec![FieldOption::new("I have reviewed this mapping", "reviewed")],
            )
            .required_with("Confirm the mapping before finishing"),
        )
        .field(FieldDescriptor::divider("actions"))
        .field(FieldDescriptor::reset_button("reset", "Reset"))
        .field(
            FieldDescriptor::submit_button("finish", "Finish")
                .disabled_when(|values| values.get("confirm").is_none_or(FieldValue::is_empty)),
        )
        .build()?;

    Ok(WizardStep::new("summary", "Summary", form))
}

/// URI shaped and not already mapped in the dialect
async fn check_claim_uri(value: FieldValue, _: Snapshot) -> ValidationResult {
    let uri = value.as_text().trim().to_string();
    let looks_like_uri = (uri.starts_with("http://") || uri.starts_with("https://"))
        && !uri.contains(char::is_whitespace);
    if !looks_like_uri {
        return ValidationResult::invalid("Please enter a valid URI");
    }

    tokio::time::sleep(LOOKUP_DELAY).await;
    if EXISTING_CLAIMS.contains(&uri.as_str()) {
        ValidationResult::invalid("A claim with this URI already exists")
    } else {
        ValidationResult::valid()
    }
}

fn check_attribute_name(value: &FieldValue, result: &mut ValidationResult, _: &Snapshot) {
    let name = value.as_text();
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        result.push_error("Only letters, digits and underscores are allowed");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        result.push_error("Attribute names cannot start with a digit");
    }
}

/// Checking "required" also checks "supported by default"
fn required_implies_supported(form: &FormInstance) {
    let weak = form.downgrade();
    form.listen(move |values| {
        let flags = values
            .get("flags")
            .map(FieldValue::as_list)
            .unwrap_or_default();
        let required = flags.iter().any(|flag| flag == "required");
        let supported = flags.iter().any(|flag| flag == "supportedByDefault");
        if !required || supported {
            return;
        }
        if let Some(form) = weak.upgrade() {
            if let Err(err) = form.toggle("flags", "supportedByDefault") {
                tracing::warn!("claim wizard: could not update flags: {}", err);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wizard_has_three_steps() {
        let wizard = build_wizard(&EngineConfig::default()).unwrap();
        let names: Vec<&str> = wizard.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["claim", "attribute", "summary"]);
    }

    #[test]
    fn test_required_flag_cascades() {
        let step = attribute_step(&EngineConfig::default()).unwrap();

        step.form.toggle("flags", "required").unwrap();

        assert_eq!(
            step.form.get_value("flags"),
            Some(FieldValue::from(vec!["required", "supportedByDefault"]))
        );
    }

    #[test]
    fn test_finish_waits_for_confirmation() {
        let step = summary_step(&EngineConfig::default()).unwrap();
        assert!(step.form.is_disabled("finish"));
        assert!(!step.form.is_disabled("reset"));

        step.form.toggle("confirm", "reviewed").unwrap();

        assert!(!step.form.is_disabled("finish"));
    }

    #[test]
    fn test_attribute_name_rules() {
        let mut result = ValidationResult::valid();
        check_attribute_name(&"9lives".into(), &mut result, &Snapshot::default());
        assert_eq!(
            result.error_messages,
            vec!["Attribute names cannot start with a digit".to_string()]
        );

        let mut result = ValidationResult::valid();
        check_attribute_name(&"email_address".into(), &mut result, &Snapshot::default());
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_claim_uri_checks() {
        let values = Snapshot::default();
        assert_eq!(
            check_claim_uri("not a uri".into(), values.clone()).await,
            ValidationResult::invalid("Please enter a valid URI")
        );
        assert_eq!(
            check_claim_uri(EXISTING_CLAIMS[0].into(), values.clone()).await,
            ValidationResult::invalid("A claim with this URI already exists")
        );
        assert!(
            check_claim_uri("http://schemas.example.org/claims/email".into(), values)
                .await
                .is_valid
        );
    }
}
