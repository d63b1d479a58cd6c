//! Per-entity-kind tracked-field schemas.
//!
//! A closed enum instead of a string-keyed runtime map: every kind carries
//! its statically known field list, and the match is checked for
//! exhaustiveness at compile time.

use serde::{Deserialize, Serialize};

/// Value families the audit diff knows how to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Boolean,
    Number,
    Date,
    Money,
}

/// One audited field: the stored document's key plus its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedField {
    pub key: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
}

const fn field(key: &'static str, label: &'static str, value_type: ValueType) -> TrackedField {
    TrackedField {
        key,
        label,
        value_type,
    }
}

/// Entity kinds with an audited field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Sale,
    Service,
    Customer,
    Category,
    PaymentMethod,
    Template,
}

/// Field keys and labels follow the stored documents, which carry the
/// operator-facing Spanish names (`activo`, `precio`, ...).
static SALE_FIELDS: &[TrackedField] = &[
    field("cliente", "Cliente", ValueType::String),
    field("servicio", "Servicio", ValueType::String),
    field("precio", "Precio", ValueType::Money),
    field("moneda", "Moneda", ValueType::String),
    field("ciclo", "Ciclo", ValueType::String),
    field("fechaVencimiento", "Fecha de vencimiento", ValueType::Date),
    field("metodoPago", "Método de pago", ValueType::String),
    field("activo", "Activo", ValueType::Boolean),
    field("notas", "Notas", ValueType::String),
];

static SERVICE_FIELDS: &[TrackedField] = &[
    field("nombre", "Nombre", ValueType::String),
    field("costo", "Costo", ValueType::Money),
    field("moneda", "Moneda", ValueType::String),
    field("ciclo", "Ciclo", ValueType::String),
    field("fechaVencimiento", "Fecha de vencimiento", ValueType::Date),
    field("categoria", "Categoría", ValueType::String),
    field("activo", "Activo", ValueType::Boolean),
];

static CUSTOMER_FIELDS: &[TrackedField] = &[
    field("nombre", "Nombre", ValueType::String),
    field("correo", "Correo", ValueType::String),
    field("telefono", "Teléfono", ValueType::String),
    field("notas", "Notas", ValueType::String),
];

static CATEGORY_FIELDS: &[TrackedField] = &[
    field("nombre", "Nombre", ValueType::String),
    field("descripcion", "Descripción", ValueType::String),
];

static PAYMENT_METHOD_FIELDS: &[TrackedField] = &[
    field("nombre", "Nombre", ValueType::String),
    field("activo", "Activo", ValueType::Boolean),
];

static TEMPLATE_FIELDS: &[TrackedField] = &[
    field("nombre", "Nombre", ValueType::String),
    field("asunto", "Asunto", ValueType::String),
    field("contenido", "Contenido", ValueType::String),
];

impl EntityKind {
    /// Kind names as they appear in activity-log entries.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "sale" => Some(EntityKind::Sale),
            "service" => Some(EntityKind::Service),
            "customer" => Some(EntityKind::Customer),
            "category" => Some(EntityKind::Category),
            "payment-method" => Some(EntityKind::PaymentMethod),
            "template" => Some(EntityKind::Template),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Sale => "sale",
            EntityKind::Service => "service",
            EntityKind::Customer => "customer",
            EntityKind::Category => "category",
            EntityKind::PaymentMethod => "payment-method",
            EntityKind::Template => "template",
        }
    }

    pub fn tracked_fields(self) -> &'static [TrackedField] {
        match self {
            EntityKind::Sale => SALE_FIELDS,
            EntityKind::Service => SERVICE_FIELDS,
            EntityKind::Customer => CUSTOMER_FIELDS,
            EntityKind::Category => CATEGORY_FIELDS,
            EntityKind::PaymentMethod => PAYMENT_METHOD_FIELDS,
            EntityKind::Template => TEMPLATE_FIELDS,
        }
    }
}
