use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::catalog::{insert_opt, ArgumentField, Entity, Method, MethodKind, MethodShape};
use crate::catalog::query::Comparator;
use crate::request::Arguments;
use crate::types::Result;

/// `<Entity>/changes` arguments
#[derive(Debug, Clone)]
pub struct ChangesRequest<T: Entity> {
    account_id: String,
    since_state: String,
    max_changes: Option<u64>,
    entity: PhantomData<T>,
}

impl<T: Entity> ChangesRequest<T> {
    pub fn new(account_id: impl Into<String>, since_state: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            since_state: since_state.into(),
            max_changes: None,
            entity: PhantomData,
        }
    }

    pub fn max_changes(mut self, max_changes: u64) -> Self {
        self.max_changes = Some(max_changes);
        self
    }
}

impl<T: Entity> Method for ChangesRequest<T> {
    type Response = ChangesResponse;

    fn name(&self) -> String {
        format!("{}/changes", T::NAME)
    }

    fn into_arguments(self) -> Result<Arguments> {
        let mut arguments = Arguments::new()
            .with("accountId", self.account_id)
            .with("sinceState", self.since_state);
        insert_opt(&mut arguments, "maxChanges", self.max_changes)?;
        Ok(arguments)
    }
}

/// `<Entity>/changes` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesResponse {
    pub account_id: String,
    pub old_state: String,
    pub new_state: String,
    #[serde(default)]
    pub has_more_changes: bool,
    #[serde(default)]
    pub created: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub destroyed: Vec<String>,
}

/// `<Entity>/queryChanges` arguments
#[derive(Debug, Clone)]
pub struct QueryChangesRequest<T: Entity> {
    account_id: String,
    since_query_state: String,
    filter: Option<T::Filter>,
    sort: Vec<Comparator>,
    max_changes: Option<u64>,
    up_to_id: Option<String>,
    calculate_total: bool,
    entity: PhantomData<T>,
}

impl<T: Entity> QueryChangesRequest<T> {
    pub fn new(account_id: impl Into<String>, since_query_state: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            since_query_state: since_query_state.into(),
            filter: None,
            sort: Vec::new(),
            max_changes: None,
            up_to_id: None,
            calculate_total: false,
            entity: PhantomData,
        }
    }

    /// Must match the filter of the original query
    pub fn filter(mut self, filter: T::Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Must match the sort of the original query
    pub fn sort(mut self, comparator: Comparator) -> Self {
        self.sort.push(comparator);
        self
    }

    pub fn max_changes(mut self, max_changes: u64) -> Self {
        self.max_changes = Some(max_changes);
        self
    }

    pub fn up_to_id(mut self, id: impl Into<String>) -> Self {
        self.up_to_id = Some(id.into());
        self
    }

    pub fn calculate_total(mut self) -> Self {
        self.calculate_total = true;
        self
    }
}

impl<T: Entity> Method for QueryChangesRequest<T> {
    type Response = QueryChangesResponse;

    fn name(&self) -> String {
        format!("{}/queryChanges", T::NAME)
    }

    fn into_arguments(self) -> Result<Arguments> {
        let mut arguments = Arguments::new()
            .with("accountId", self.account_id)
            .with("sinceQueryState", self.since_query_state);
        insert_opt(&mut arguments, "filter", self.filter)?;
        insert_opt(&mut arguments, "sort", Some(self.sort).filter(|s| !s.is_empty()))?;
        insert_opt(&mut arguments, "maxChanges", self.max_changes)?;
        insert_opt(&mut arguments, "upToId", self.up_to_id)?;
        insert_opt(&mut arguments, "calculateTotal", Some(true).filter(|_| self.calculate_total))?;
        Ok(arguments)
    }
}

/// Item inserted into a query result, with its new position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedItem {
    pub id: String,
    pub index: u64,
}

/// `<Entity>/queryChanges` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChangesResponse {
    pub account_id: String,
    pub old_query_state: String,
    pub new_query_state: String,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub added: Vec<AddedItem>,
}

pub(crate) fn changes_shape<T: Entity>() -> MethodShape {
    MethodShape::new::<ChangesResponse>(
        format!("{}/changes", T::NAME),
        MethodKind::Changes,
        vec![
            ArgumentField::required("accountId"),
            ArgumentField::required("sinceState").referable(),
            ArgumentField::optional("maxChanges"),
        ],
    )
}

pub(crate) fn query_changes_shape<T: Entity>() -> MethodShape {
    MethodShape::new::<QueryChangesResponse>(
        format!("{}/queryChanges", T::NAME),
        MethodKind::QueryChanges,
        vec![
            ArgumentField::required("accountId"),
            ArgumentField::required("sinceQueryState").referable(),
            ArgumentField::optional("filter"),
            ArgumentField::optional("sort"),
            ArgumentField::optional("maxChanges"),
            ArgumentField::optional("upToId"),
            ArgumentField::optional("calculateTotal"),
        ],
    )
}
