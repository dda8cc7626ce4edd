//! Product create/edit form.
//!
//! Holds the live field values of one form instance, the role of the operator
//! and, when editing, the persisted product the form was opened from. The
//! quantity rules implement the cashier ratchet: a cashier editing an existing
//! product may keep or lower its quantity but never raise it.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

use super::validators::{
    non_negative_decimal, non_negative_int, not_above, parse_decimal, parse_int, required, storable_price,
};
use super::{check_field, FieldErrors, FieldRule, FormField, Validated};
use crate::backend::BackendError;
use crate::database::models::{Product, ProductFields};
use crate::types::Role;

pub const NAME_REQUIRED: &str = "Product name is required.";
pub const PRICE_NON_NEGATIVE: &str = "Price must equal or more than 0.";
pub const PRICE_OUT_OF_RANGE: &str = "Price can have at most 2 decimals and must be below 10000000000.";
pub const QUANTITY_NON_NEGATIVE: &str = "Quantity must equal or more than 0.";
pub const QUANTITY_CANNOT_INCREMENT: &str =
    "Cannot increase quantity. Please contact an admin to do that for you.";

pub const NAME_NOT_UNIQUE: &str = "Product name needs to be unique.";
pub const CANNOT_EDIT: &str = "Cannot edit product.";
pub const CANNOT_CREATE: &str = "Cannot create product.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductField {
    Name,
    Price,
    Quantity,
}

impl FormField for ProductField {
    fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::Quantity => "quantity",
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the quantity rules need to know about the operator and the original
#[derive(Debug, Clone, Copy)]
struct RuleContext {
    role: Role,
    original_quantity: Option<i32>,
}

fn name_required(name: &str, _: &RuleContext) -> bool {
    required(name)
}

fn price_non_negative(price: &Option<Decimal>, _: &RuleContext) -> bool {
    non_negative_decimal(*price)
}

fn price_storable(price: &Option<Decimal>, _: &RuleContext) -> bool {
    price.map_or(true, storable_price)
}

fn quantity_non_negative(quantity: &Option<i32>, _: &RuleContext) -> bool {
    non_negative_int(*quantity)
}

fn quantity_cannot_increment(quantity: &Option<i32>, ctx: &RuleContext) -> bool {
    match (ctx.role, ctx.original_quantity) {
        (Role::Cashier, Some(original)) => not_above(*quantity, original),
        _ => true,
    }
}

const NAME_RULES: &[FieldRule<str, RuleContext>] = &[FieldRule {
    name: "required",
    message: NAME_REQUIRED,
    check: name_required,
}];

const PRICE_RULES: &[FieldRule<Option<Decimal>, RuleContext>] = &[
    FieldRule {
        name: "positive",
        message: PRICE_NON_NEGATIVE,
        check: price_non_negative,
    },
    FieldRule {
        name: "storable",
        message: PRICE_OUT_OF_RANGE,
        check: price_storable,
    },
];

const QUANTITY_RULES: &[FieldRule<Option<i32>, RuleContext>] = &[
    FieldRule {
        name: "positive",
        message: QUANTITY_NON_NEGATIVE,
        check: quantity_non_negative,
    },
    FieldRule {
        name: "cannotIncrement",
        message: QUANTITY_CANNOT_INCREMENT,
        check: quantity_cannot_increment,
    },
];

/// Live field values. `None` for a number means the input did not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
}

impl ProductDraft {
    fn from_original(original: Option<&Product>) -> Self {
        match original {
            Some(product) => Self {
                name: product.name.clone(),
                price: Some(product.price),
                quantity: Some(product.quantity),
            },
            None => Self {
                name: String::new(),
                price: Some(Decimal::ZERO),
                quantity: Some(0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Opened, untouched
    Idle,
    Editing,
    /// Payload handed to the submit handler, waiting for its result
    Submitting,
    /// Last submission failed; the error message is set
    Failed,
    /// Submitted successfully or cancelled
    Closed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Only an admin can change the product {0}.")]
    ReadOnlyField(ProductField),

    #[error("Role is not resolved yet")]
    RoleUnresolved,

    #[error("Form cannot be changed while {0:?}")]
    NotEditable(FormState),

    #[error("{0}")]
    Invalid(FieldErrors<ProductField>),
}

/// Result of handing a payload to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(Product),
    Failed(&'static str),
    /// The form was closed before the result arrived
    Discarded,
}

/// Pending quantity change shown next to the quantity label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityDelta(pub i64);

impl fmt::Display for QuantityDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ProductForm {
    role: Role,
    original: Option<Product>,
    draft: ProductDraft,
    state: FormState,
    field_errors: FieldErrors<ProductField>,
    error_message: Option<&'static str>,
}

impl ProductForm {
    /// Blank form for a new product
    pub fn create(role: Role) -> Self {
        Self::open(role, None)
    }

    /// Form pre-filled from the persisted `product`
    pub fn edit(role: Role, product: &Product) -> Self {
        Self::open(role, Some(product.clone()))
    }

    fn open(role: Role, original: Option<Product>) -> Self {
        Self {
            role,
            draft: ProductDraft::from_original(original.as_ref()),
            original,
            state: FormState::Idle,
            field_errors: FieldErrors::new(),
            error_message: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Follow a role change reported after the form opened.
    ///
    /// Enabled state and the quantity rules are derived from the role, so they
    /// switch over with it. Field errors from the old role are cleared.
    pub fn set_role(&mut self, role: Role) {
        if role == self.role {
            return;
        }
        debug!("Product form role {:?} -> {:?}", self.role, role);
        self.role = role;
        self.field_errors = FieldErrors::new();
    }

    pub fn original(&self) -> Option<&Product> {
        self.original.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn field_errors(&self) -> &FieldErrors<ProductField> {
        &self.field_errors
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error_message
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_edit() {
            "Save"
        } else {
            "Create"
        }
    }

    /// Field that receives focus when the form opens
    pub fn autofocus(&self) -> ProductField {
        if self.is_edit() && self.role != Role::Admin {
            ProductField::Quantity
        } else {
            ProductField::Name
        }
    }

    /// Name and price are admin-only; quantity is open to every role
    pub fn field_enabled(&self, field: ProductField) -> bool {
        match field {
            ProductField::Name | ProductField::Price => self.role == Role::Admin,
            ProductField::Quantity => true,
        }
    }

    fn rule_context(&self) -> RuleContext {
        RuleContext {
            role: self.role,
            original_quantity: self.original.as_ref().map(|p| p.quantity),
        }
    }

    fn is_mutable(&self) -> bool {
        matches!(self.state, FormState::Idle | FormState::Editing | FormState::Failed)
    }

    fn begin_edit(&mut self) -> Result<(), FormError> {
        if !self.is_mutable() {
            return Err(FormError::NotEditable(self.state));
        }
        self.state = FormState::Editing;
        Ok(())
    }

    fn guard_admin_field(&self, field: ProductField, unchanged: bool) -> Result<(), FormError> {
        if unchanged || self.field_enabled(field) {
            Ok(())
        } else {
            Err(FormError::ReadOnlyField(field))
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FormError> {
        let name = name.into();
        self.guard_admin_field(ProductField::Name, name == self.draft.name)?;
        self.begin_edit()?;
        self.draft.name = name;
        Ok(())
    }

    pub fn set_price(&mut self, price: Option<Decimal>) -> Result<(), FormError> {
        self.guard_admin_field(ProductField::Price, price == self.draft.price)?;
        self.begin_edit()?;
        self.draft.price = price;
        Ok(())
    }

    /// Set price from raw input text
    pub fn set_price_input(&mut self, input: &str) -> Result<(), FormError> {
        self.set_price(parse_decimal(input))
    }

    pub fn set_quantity(&mut self, quantity: Option<i32>) -> Result<(), FormError> {
        self.begin_edit()?;
        self.draft.quantity = quantity;
        Ok(())
    }

    /// Set quantity from raw input text
    pub fn set_quantity_input(&mut self, input: &str) -> Result<(), FormError> {
        self.set_quantity(parse_int(input))
    }

    /// Decrement is disabled at or below zero
    pub fn can_decrement(&self) -> bool {
        self.is_mutable() && matches!(self.draft.quantity, Some(q) if q > 0)
    }

    /// Increment is disabled for a cashier once the live quantity reaches the
    /// original quantity, and for everyone while the role is unresolved.
    pub fn can_increment(&self) -> bool {
        let Some(quantity) = self.draft.quantity else {
            return false;
        };
        if !self.is_mutable() || quantity == i32::MAX {
            return false;
        }
        match self.role {
            Role::Admin => true,
            Role::Cashier => self.original.as_ref().map_or(true, |p| quantity < p.quantity),
            Role::Unknown => false,
        }
    }

    /// Lower quantity by one. Returns false and leaves the form untouched when disabled.
    pub fn decrement(&mut self) -> bool {
        if !self.can_decrement() {
            return false;
        }
        self.state = FormState::Editing;
        self.draft.quantity = self.draft.quantity.map(|q| q - 1);
        true
    }

    /// Raise quantity by one. Returns false and leaves the form untouched when disabled.
    pub fn increment(&mut self) -> bool {
        if !self.can_increment() {
            return false;
        }
        self.state = FormState::Editing;
        self.draft.quantity = self.draft.quantity.map(|q| q + 1);
        true
    }

    /// Signed difference to the original quantity, when editing and changed
    pub fn quantity_delta(&self) -> Option<QuantityDelta> {
        let original = self.original.as_ref()?;
        let quantity = self.draft.quantity?;
        (quantity != original.quantity).then(|| QuantityDelta(i64::from(quantity) - i64::from(original.quantity)))
    }

    /// Run every field rule against the live values
    pub fn validate(&self) -> Validated<ProductFields, ProductField> {
        let ctx = self.rule_context();
        let mut errors = FieldErrors::new();
        errors.record(ProductField::Name, check_field(NAME_RULES, self.draft.name.as_str(), &ctx));
        errors.record(ProductField::Price, check_field(PRICE_RULES, &self.draft.price, &ctx));
        errors.record(ProductField::Quantity, check_field(QUANTITY_RULES, &self.draft.quantity, &ctx));

        match (self.draft.price, self.draft.quantity) {
            (Some(price), Some(quantity)) if errors.is_empty() => Ok(ProductFields {
                name: self.draft.name.clone(),
                quantity,
                price,
            }),
            _ => Err(errors),
        }
    }

    /// Submit control state
    pub fn can_submit(&self) -> bool {
        self.is_mutable() && self.role.is_resolved()
    }

    /// Validate and, if valid, enter `Submitting` and return the payload.
    ///
    /// Nothing is emitted on failure; the field errors are kept on the form.
    pub fn begin_submit(&mut self) -> Result<ProductFields, FormError> {
        if !self.is_mutable() {
            return Err(FormError::NotEditable(self.state));
        }
        if !self.role.is_resolved() {
            return Err(FormError::RoleUnresolved);
        }

        match self.validate() {
            Ok(fields) => {
                self.field_errors = FieldErrors::new();
                self.state = FormState::Submitting;
                Ok(fields)
            }
            Err(errors) => {
                debug!("Product form rejected: {}", errors);
                self.field_errors = errors.clone();
                self.state = FormState::Editing;
                Err(FormError::Invalid(errors))
            }
        }
    }

    /// Apply the submit handler's result. Results for a closed form are dropped.
    pub fn finish_submit(&mut self, result: Result<Product, BackendError>) -> SubmitOutcome {
        if self.state != FormState::Submitting {
            debug!("Dropping submit result for form in state {:?}", self.state);
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(product) => {
                self.error_message = None;
                self.state = FormState::Closed;
                SubmitOutcome::Succeeded(product)
            }
            Err(err) => {
                let message = if err.is_unique_violation() {
                    NAME_NOT_UNIQUE
                } else if self.is_edit() {
                    CANNOT_EDIT
                } else {
                    CANNOT_CREATE
                };
                warn!("Product submission failed: {}", err);
                self.error_message = Some(message);
                self.state = FormState::Failed;
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Full submit protocol around an async handler
    pub async fn submit<F, Fut>(&mut self, handler: F) -> Result<SubmitOutcome, FormError>
    where
        F: FnOnce(ProductFields) -> Fut,
        Fut: Future<Output = Result<Product, BackendError>>,
    {
        let fields = self.begin_submit()?;
        let result = handler(fields).await;
        Ok(self.finish_submit(result))
    }

    /// Drop pending edits and close, without validation
    pub fn cancel(&mut self) {
        self.draft = ProductDraft::from_original(self.original.as_ref());
        self.field_errors = FieldErrors::new();
        self.error_message = None;
        self.state = FormState::Closed;
    }
}
