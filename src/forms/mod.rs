//! Headless form engine
//!
//! - `field`: field descriptors and values
//! - `registry`: fields mounted in one form
//! - `store`: ordered values and snapshots
//! - `validation`: validators and the validation engine
//! - `submission`: the submission state machine and submit handlers
//! - `form`: the form instance handle tying these together
//! - `wizard`: multi-step wizards over several form instances

mod field;
mod form;
mod registry;
mod store;
mod submission;
mod validation;
mod wizard;

pub use field::{DisabledWhen, FieldDescriptor, FieldKind, FieldOption, FieldValue};
pub use form::{FormBuilder, FormInstance, Listener, WeakFormInstance};
pub use registry::FieldRegistry;
pub use store::{Snapshot, ValueStore};
pub use submission::{
    submit_fn, SubmissionController, SubmitFn, SubmitHandler, SubmitOutcome, SubmitState, Trigger,
};
pub use validation::{
    async_validator_fn, validator_fn, AsyncFnValidator, FieldStatus, FnValidator, FormValidation,
    ValidationEngine, ValidationResult, Validator,
};
pub use wizard::{WizardConsumer, WizardCoordinator, WizardProgress, WizardStatus, WizardStep};
