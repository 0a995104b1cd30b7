use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{insert_opt, ArgumentField, Entity, Method, MethodKind, MethodShape};
use crate::request::{Argument, Arguments, CreationIdReference, ResultReference};
use crate::types::Result;

/// `<Entity>/set` arguments: create, update and destroy in one call
#[derive(Debug, Clone)]
pub struct SetRequest<T: Entity> {
    account_id: String,
    if_in_state: Option<String>,
    create: BTreeMap<String, T>,
    update: BTreeMap<String, Value>,
    destroy: Option<Argument>,
    entity: PhantomData<T>,
}

impl<T: Entity> SetRequest<T> {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            if_in_state: None,
            create: BTreeMap::new(),
            update: BTreeMap::new(),
            destroy: None,
            entity: PhantomData,
        }
    }

    /// Expected current state; the server answers `stateMismatch` otherwise
    pub fn if_in_state(mut self, state: impl Into<String>) -> Self {
        self.if_in_state = Some(state.into());
        self
    }

    /// Queue an object for creation under a caller-chosen creation id.
    /// Returns the reference later calls of the same batch can use as its id.
    pub fn create(&mut self, creation_id: impl Into<String>, object: T) -> CreationIdReference {
        let creation_id = creation_id.into();
        let reference = CreationIdReference::new(creation_id.clone());
        self.create.insert(creation_id, object);
        reference
    }

    /// Patch an existing object, keyed by id or creation id reference
    pub fn update(&mut self, id: impl Into<String>, patch: Value) -> &mut Self {
        self.update.insert(id.into(), patch);
        self
    }

    pub fn destroy<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.destroy = Some(Argument::Value(ids.into()));
        self
    }

    /// Destroy the ids found in an earlier call's result
    pub fn destroy_ref(&mut self, reference: ResultReference) -> &mut Self {
        self.destroy = Some(Argument::ResultOf(reference));
        self
    }
}

impl<T: Entity> Method for SetRequest<T> {
    type Response = SetResponse<T>;

    fn name(&self) -> String {
        format!("{}/set", T::NAME)
    }

    fn into_arguments(self) -> Result<Arguments> {
        let mut arguments = Arguments::new().with("accountId", self.account_id);
        insert_opt(&mut arguments, "ifInState", self.if_in_state)?;
        insert_opt(&mut arguments, "create", Some(self.create).filter(|c| !c.is_empty()))?;
        insert_opt(&mut arguments, "update", Some(self.update).filter(|u| !u.is_empty()))?;
        if let Some(destroy) = self.destroy {
            arguments.insert("destroy", destroy);
        }
        Ok(arguments)
    }
}

/// Per-object failure inside a successful `/set` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetError {
    /// e.g. "invalidProperties", "notFound", "overQuota"
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

/// `<Entity>/set` result
///
/// `created` holds only the properties the server set or changed, so the
/// objects are partial; `id` is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Entity"))]
pub struct SetResponse<T: Entity> {
    pub account_id: String,
    #[serde(default)]
    pub old_state: Option<String>,
    pub new_state: String,
    #[serde(default)]
    pub created: Option<BTreeMap<String, T>>,
    #[serde(default)]
    pub updated: Option<BTreeMap<String, Option<Value>>>,
    #[serde(default)]
    pub destroyed: Option<Vec<String>>,
    #[serde(default)]
    pub not_created: Option<BTreeMap<String, SetError>>,
    #[serde(default)]
    pub not_updated: Option<BTreeMap<String, SetError>>,
    #[serde(default)]
    pub not_destroyed: Option<BTreeMap<String, SetError>>,
}

impl<T: Entity> SetResponse<T> {
    pub fn created(&self, creation_id: &str) -> Option<&T> {
        self.created.as_ref()?.get(creation_id)
    }

    pub fn not_created(&self, creation_id: &str) -> Option<&SetError> {
        self.not_created.as_ref()?.get(creation_id)
    }

    /// Whether any create, update or destroy was rejected
    pub fn has_errors(&self) -> bool {
        [&self.not_created, &self.not_updated, &self.not_destroyed]
            .iter()
            .any(|errors| errors.as_ref().is_some_and(|e| !e.is_empty()))
    }
}

pub(crate) fn shape<T: Entity>() -> MethodShape {
    MethodShape::new::<SetResponse<T>>(
        format!("{}/set", T::NAME),
        MethodKind::Set,
        vec![
            ArgumentField::required("accountId"),
            ArgumentField::optional("ifInState"),
            ArgumentField::optional("create"),
            ArgumentField::optional("update"),
            ArgumentField::optional("destroy").referable(),
        ],
    )
}
