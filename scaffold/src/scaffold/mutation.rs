use super::{
    permission::{AllowAll, PermissionChecker},
    OperationType, Resolve, Resolved, Scaffold,
};
use crate::{
    backend::{Arguments, Mutate, QueryContext},
    error::UnknownTypeSnafu,
    record::Row,
    schema::{parse_type_ref, ArgumentDefinition, Manager, Operation},
    Error,
};
use async_graphql::dynamic::TypeRef;
use async_trait::async_trait;
use derivative::Derivative;
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for a root mutation returning the affected record.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct MutationScaffolder {
    name: String,
    type_name: String,
    description: Option<String>,
    args: BTreeMap<String, String>,
    #[derivative(Debug = "ignore")]
    delegate: Arc<dyn Mutate>,
    #[derivative(Debug = "ignore")]
    permission: Arc<dyn PermissionChecker>,
}

impl MutationScaffolder {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        delegate: impl Mutate + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            args: Default::default(),
            delegate: Arc::new(delegate),
            permission: Arc::new(AllowAll),
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn add_args<I, K, V>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|(name, ty)| (name.into(), ty.into())));
        self
    }

    /// Gate the mutation on the requester.
    ///
    /// The checker is invoked with an empty result set before the delegate runs. If it fails,
    /// nothing is changed and the mutation returns `null`.
    pub fn set_permission_checker(
        &mut self,
        checker: impl PermissionChecker + 'static,
    ) -> &mut Self {
        self.permission = Arc::new(checker);
        self
    }

    pub fn scaffold(&self, manager: &Manager) -> Result<Scaffold, Error> {
        manager.get_type(&self.type_name).context(UnknownTypeSnafu {
            name: &self.type_name,
        })?;
        let args = self
            .args
            .iter()
            .map(|(name, ty)| {
                let ty = parse_type_ref(ty).ok_or_else(|| {
                    Error::config(&self.name, format!("invalid type {ty:?} for argument {name}"))
                })?;
                Ok(ArgumentDefinition::new(name, ty))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let resolver = MutationResolver {
            operation: self.name.clone(),
            delegate: self.delegate.clone(),
            permission: self.permission.clone(),
        };
        Ok(Scaffold::new(
            self.name.clone(),
            self.description.clone(),
            OperationType::Plain(TypeRef::named(&self.type_name)),
            args,
            Arc::new(resolver),
        ))
    }

    /// Register this mutation with `manager`, to be scaffolded when the schema is finished.
    pub fn add_to_manager(self, manager: &mut Manager) {
        let name = self.name.clone();
        manager.add_mutation(Operation::deferred(move |manager| self.scaffold(manager)), name);
    }
}

struct MutationResolver {
    operation: String,
    delegate: Arc<dyn Mutate>,
    permission: Arc<dyn PermissionChecker>,
}

#[async_trait]
impl Resolve for MutationResolver {
    async fn resolve(
        &self,
        _parent: Option<&Row>,
        args: &Arguments,
        ctx: &QueryContext,
    ) -> Result<Resolved, Error> {
        if !self.permission.check_permission(ctx, &[]) {
            tracing::debug!("{}: permission denied", self.operation);
            return Ok(Resolved::Item(None));
        }
        let row = self.delegate.mutate(args, ctx).await?;
        tracing::info!("{}: mutated {:?}", self.operation, row.as_ref().and_then(Row::id));
        Ok(Resolved::Item(row))
    }
}
