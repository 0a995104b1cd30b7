use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::catalog::{ArgumentField, Entity, Method, MethodKind, MethodShape};
use crate::request::{Argument, Arguments, ResultReference};
use crate::types::Result;

/// `<Entity>/get` arguments
#[derive(Debug, Clone)]
pub struct GetRequest<T: Entity> {
    account_id: String,
    ids: Option<Argument>,
    properties: Option<Argument>,
    entity: PhantomData<T>,
}

impl<T: Entity> GetRequest<T> {
    /// Fetch every object of the account (no `ids` argument)
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ids: None,
            properties: None,
            entity: PhantomData,
        }
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.ids = Some(Argument::Value(ids.into()));
        self
    }

    /// Take the ids from an earlier call, typically `/query` at path `/ids`
    pub fn ids_ref(mut self, reference: ResultReference) -> Self {
        self.ids = Some(Argument::ResultOf(reference));
        self
    }

    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        self.properties = Some(Argument::Value(properties.into()));
        self
    }
}

impl<T: Entity> Method for GetRequest<T> {
    type Response = GetResponse<T>;

    fn name(&self) -> String {
        format!("{}/get", T::NAME)
    }

    fn into_arguments(self) -> Result<Arguments> {
        let mut arguments = Arguments::new().with("accountId", self.account_id);
        if let Some(ids) = self.ids {
            arguments.insert("ids", ids);
        }
        if let Some(properties) = self.properties {
            arguments.insert("properties", properties);
        }
        Ok(arguments)
    }
}

/// `<Entity>/get` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Entity"))]
pub struct GetResponse<T: Entity> {
    pub account_id: String,
    pub state: String,
    pub list: Vec<T>,
    #[serde(default)]
    pub not_found: Vec<String>,
}

pub(crate) fn shape<T: Entity>() -> MethodShape {
    MethodShape::new::<GetResponse<T>>(
        format!("{}/get", T::NAME),
        MethodKind::Get,
        vec![
            ArgumentField::required("accountId"),
            ArgumentField::optional("ids").referable(),
            ArgumentField::optional("properties").referable(),
        ],
    )
}
