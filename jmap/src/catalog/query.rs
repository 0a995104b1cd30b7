use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::catalog::{insert_opt, ArgumentField, Entity, Method, MethodKind, MethodShape};
use crate::request::Arguments;
use crate::types::Result;

/// Sort criterion for `/query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparator {
    pub property: String,
    #[serde(default = "default_true")]
    pub is_ascending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Comparator {
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            is_ascending: true,
            collation: None,
        }
    }

    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            is_ascending: false,
            ..Self::ascending(property)
        }
    }
}

/// `<Entity>/query` arguments
#[derive(Debug, Clone)]
pub struct QueryRequest<T: Entity> {
    account_id: String,
    filter: Option<T::Filter>,
    sort: Vec<Comparator>,
    position: Option<i64>,
    anchor: Option<String>,
    anchor_offset: Option<i64>,
    limit: Option<u64>,
    calculate_total: bool,
    entity: PhantomData<T>,
}

impl<T: Entity> QueryRequest<T> {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            filter: None,
            sort: Vec::new(),
            position: None,
            anchor: None,
            anchor_offset: None,
            limit: None,
            calculate_total: false,
            entity: PhantomData,
        }
    }

    pub fn filter(mut self, filter: T::Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, comparator: Comparator) -> Self {
        self.sort.push(comparator);
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Window the results around an id instead of a position
    pub fn anchor(mut self, anchor: impl Into<String>, offset: i64) -> Self {
        self.anchor = Some(anchor.into());
        self.anchor_offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn calculate_total(mut self) -> Self {
        self.calculate_total = true;
        self
    }
}

impl<T: Entity> Method for QueryRequest<T> {
    type Response = QueryResponse;

    fn name(&self) -> String {
        format!("{}/query", T::NAME)
    }

    fn into_arguments(self) -> Result<Arguments> {
        let mut arguments = Arguments::new().with("accountId", self.account_id);
        insert_opt(&mut arguments, "filter", self.filter)?;
        insert_opt(&mut arguments, "sort", Some(self.sort).filter(|s| !s.is_empty()))?;
        insert_opt(&mut arguments, "position", self.position)?;
        insert_opt(&mut arguments, "anchor", self.anchor)?;
        insert_opt(&mut arguments, "anchorOffset", self.anchor_offset)?;
        insert_opt(&mut arguments, "limit", self.limit)?;
        insert_opt(&mut arguments, "calculateTotal", Some(true).filter(|_| self.calculate_total))?;
        Ok(arguments)
    }
}

/// `<Entity>/query` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub account_id: String,
    pub query_state: String,
    #[serde(default)]
    pub can_calculate_changes: bool,
    #[serde(default)]
    pub position: u64,
    pub ids: Vec<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

pub(crate) fn shape<T: Entity>() -> MethodShape {
    MethodShape::new::<QueryResponse>(
        format!("{}/query", T::NAME),
        MethodKind::Query,
        vec![
            ArgumentField::required("accountId"),
            ArgumentField::optional("filter"),
            ArgumentField::optional("sort"),
            ArgumentField::optional("position"),
            ArgumentField::optional("anchor").referable(),
            ArgumentField::optional("anchorOffset"),
            ArgumentField::optional("limit"),
            ArgumentField::optional("calculateTotal"),
        ],
    )
}
