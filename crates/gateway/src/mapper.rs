//! Translation between assistants-API resources and agents/messages.
//!
//! | resource  | backed by                                   |
//! |-----------|---------------------------------------------|
//! | assistant | the single default agent configuration      |
//! | thread    | one agent (`thread.id` = agent id)          |
//! | message   | one entry of the agent's history            |
//! | run       | one synchronous step; never persisted       |

use assistd_agent::{Agent, AgentEngine};
use assistd_core::agent::DEFAULT_ASSISTANT_ID;
use assistd_core::context::RequestContext;
use assistd_core::message::{Message, Role};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cursor::parse_id;
use crate::dto::{
    Assistant, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, ListMessagesParams, ListMessagesResponse, Run, Thread, ThreadMessage,
};
use crate::error::ApiError;

pub struct ResourceMapper {
    engine: AgentEngine,
}

impl ResourceMapper {
    pub fn new(engine: AgentEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &AgentEngine {
        &self.engine
    }

    async fn resolve(&self, ctx: &RequestContext, thread_id: &str) -> Result<Agent, ApiError> {
        let id = parse_id("thread_id", thread_id)?;
        Ok(self.engine.load_agent(&ctx.user_id, id).await?)
    }

    /// Describe the default assistant. Nothing is stored.
    pub fn create_assistant(
        &self,
        ctx: &RequestContext,
        request: CreateAssistantRequest,
    ) -> Assistant {
        debug!(user_id = %ctx.user_id, "Assistant descriptor requested; not persisted");
        let model = if request.model.is_empty() {
            self.engine.defaults().model.clone()
        } else {
            request.model
        };

        Assistant {
            id: DEFAULT_ASSISTANT_ID.to_string(),
            object: "assistant".into(),
            created_at: Utc::now().timestamp(),
            name: request.name,
            description: request.description,
            model,
            instructions: request.instructions,
            tools: request.tools,
            file_ids: request.file_ids,
            metadata: request.metadata,
        }
    }

    pub async fn create_thread(
        &self,
        ctx: &RequestContext,
        request: CreateThreadRequest,
    ) -> Result<Thread, ApiError> {
        if !request.messages.is_empty() || request.assistant_name.is_some() {
            debug!(
                messages = request.messages.len(),
                assistant_name = ?request.assistant_name,
                "Ignoring initial messages and assistant name on thread creation"
            );
        }

        let agent = self.engine.create_agent(&ctx.user_id).await?;
        info!(thread_id = %agent.id(), user_id = %ctx.user_id, "Thread created");
        Ok(Thread::from(agent.record()))
    }

    pub async fn retrieve_thread(
        &self,
        ctx: &RequestContext,
        thread_id: &str,
    ) -> Result<Thread, ApiError> {
        let agent = self.resolve(ctx, thread_id).await?;
        Ok(Thread::from(agent.record()))
    }

    /// Append a message without stepping the agent.
    pub async fn create_message(
        &self,
        ctx: &RequestContext,
        thread_id: &str,
        request: CreateMessageRequest,
    ) -> Result<ThreadMessage, ApiError> {
        let role: Role = request
            .role
            .parse()
            .map_err(|e| ApiError::invalid(format!("{e}")))?;
        // System and tool turns are not part of a thread's conversation.
        if !matches!(role, Role::User | Role::Assistant) {
            return Err(ApiError::invalid(format!(
                "role must be 'user' or 'assistant', got '{role}'"
            )));
        }
        let agent = self.resolve(ctx, thread_id).await?;

        if !request.file_ids.is_empty() {
            debug!(count = request.file_ids.len(), "Ignoring message file attachments");
        }

        let mut message = Message::new(agent.id(), &ctx.user_id, role, request.content);
        message.metadata = request.metadata;
        let message = agent
            .append_messages(vec![message])
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal("append returned no message".into()))?;

        info!(thread_id = %agent.id(), message_id = %message.id, %role, "Message created");
        Ok(ThreadMessage::from_message(
            &message,
            &agent.record().assistant_id,
        ))
    }

    pub async fn list_messages(
        &self,
        ctx: &RequestContext,
        thread_id: &str,
        params: ListMessagesParams,
    ) -> Result<ListMessagesResponse, ApiError> {
        let mut query = params.into_query()?;
        let agent = self.resolve(ctx, thread_id).await?;

        let limit = query.limit;
        query.limit = limit.saturating_add(1);
        let mut page = self.engine.messages().read_range(agent.id(), &query).await?;
        let has_more = page.len() > limit;
        page.truncate(limit);

        let assistant_id = &agent.record().assistant_id;
        let messages: Vec<ThreadMessage> = page
            .iter()
            .map(|m| ThreadMessage::from_message(m, assistant_id))
            .collect();

        debug!(thread_id = %agent.id(), count = messages.len(), has_more, "Listed messages");
        Ok(ListMessagesResponse {
            first_id: messages.first().map(|m| m.id.clone()),
            last_id: messages.last().map(|m| m.id.clone()),
            messages,
            has_more,
        })
    }

    pub async fn retrieve_message(
        &self,
        ctx: &RequestContext,
        thread_id: &str,
        message_id: &str,
    ) -> Result<ThreadMessage, ApiError> {
        let message_id: Uuid = parse_id("message_id", message_id)?;
        let agent = self.resolve(ctx, thread_id).await?;

        let message = self
            .engine
            .messages()
            .get(agent.id(), message_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No message found with ID {message_id}")))?;

        Ok(ThreadMessage::from_message(
            &message,
            &agent.record().assistant_id,
        ))
    }

    /// Step the agent once over its pending history and report a completed run.
    pub async fn create_run(
        &self,
        ctx: &RequestContext,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> Result<Run, ApiError> {
        let agent = self.resolve(ctx, thread_id).await?;

        if request.assistant_id.is_some() || request.model.is_some() || !request.tools.is_empty() {
            debug!("Run overrides are not applied; the agent's configuration is used");
        }

        let outcome = agent.step(None).await?;
        let created_at = Utc::now().timestamp();
        let run_id = Uuid::new_v4();

        info!(
            thread_id = %agent.id(),
            run_id = %run_id,
            produced = outcome.messages.len(),
            "Run completed"
        );

        Ok(Run {
            id: run_id.to_string(),
            object: "thread.run".into(),
            created_at,
            thread_id: agent.id().to_string(),
            assistant_id: agent.record().assistant_id.clone(),
            status: "completed".into(),
            expires_at: created_at,
            model: agent.record().model.clone(),
            instructions: request.instructions,
            metadata: request.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use assistd_core::agent::AgentDefaults;
    use assistd_core::error::ProviderError;
    use assistd_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use assistd_store::InMemoryStore;

    struct FixedProvider;

    #[async_trait::async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: "Hi! How can I help?".into(),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    fn mapper() -> ResourceMapper {
        let store = Arc::new(InMemoryStore::new());
        let engine = AgentEngine::new(
            store.clone(),
            store,
            Arc::new(FixedProvider),
            AgentDefaults::default(),
        );
        ResourceMapper::new(engine)
    }

    fn ctx() -> RequestContext {
        RequestContext::new("alice")
    }

    fn user_message(content: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            role: "user".into(),
            content: content.into(),
            file_ids: Vec::new(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn assistant_descriptor_echoes_request() {
        let mapper = mapper();
        let assistant = mapper.create_assistant(
            &ctx(),
            CreateAssistantRequest {
                model: "gpt-4".into(),
                name: Some("helper".into()),
                instructions: Some("be nice".into()),
                ..CreateAssistantRequest::default()
            },
        );
        assert_eq!(assistant.id, DEFAULT_ASSISTANT_ID);
        assert_eq!(assistant.name.as_deref(), Some("helper"));
        assert_eq!(assistant.model, "gpt-4");
        assert_eq!(assistant.object, "assistant");
    }

    #[tokio::test]
    async fn thread_roundtrips_through_agent() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();

        let agent = mapper
            .engine()
            .get_agent(Uuid::parse_str(&thread.id).unwrap())
            .await
            .unwrap();
        assert_eq!(agent.record().created_at.timestamp(), thread.created_at);

        let first = mapper.retrieve_thread(&ctx(), &thread.id).await.unwrap();
        let second = mapper.retrieve_thread(&ctx(), &thread.id).await.unwrap();
        assert_eq!(first, thread);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn retrieve_thread_errors() {
        let mapper = mapper();
        assert!(matches!(
            mapper.retrieve_thread(&ctx(), "not-a-uuid").await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            mapper
                .retrieve_thread(&ctx(), &Uuid::new_v4().to_string())
                .await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn threads_are_private_to_their_owner() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        let other = RequestContext::new("bob");
        assert!(matches!(
            mapper.retrieve_thread(&other, &thread.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn created_message_is_listed_verbatim_without_a_step() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        let created = mapper
            .create_message(&ctx(), &thread.id, user_message("hello there"))
            .await
            .unwrap();
        assert_eq!(created.assistant_id, DEFAULT_ASSISTANT_ID);
        assert_eq!(created.thread_id, thread.id);

        let list = mapper
            .list_messages(&ctx(), &thread.id, ListMessagesParams::default())
            .await
            .unwrap();
        assert_eq!(list.messages.len(), 1);
        assert_eq!(list.messages[0].role, "user");
        assert_eq!(list.messages[0].text(), "hello there");
        assert_eq!(list.first_id.as_deref(), Some(created.id.as_str()));
        assert!(!list.has_more);

        let fetched = mapper
            .retrieve_message(&ctx(), &thread.id, &created.id)
            .await
            .unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn unknown_role_is_invalid() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        let request = CreateMessageRequest {
            role: "narrator".into(),
            ..user_message("x")
        };
        assert!(matches!(
            mapper.create_message(&ctx(), &thread.id, request).await,
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn only_conversation_roles_are_accepted() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();

        for role in ["tool", "system"] {
            let request = CreateMessageRequest {
                role: role.into(),
                ..user_message("x")
            };
            let err = mapper
                .create_message(&ctx(), &thread.id, request)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "role {role}");
        }

        let request = CreateMessageRequest {
            role: "assistant".into(),
            ..user_message("earlier answer")
        };
        let created = mapper.create_message(&ctx(), &thread.id, request).await.unwrap();
        assert_eq!(created.role, "assistant");

        // Rejected messages never reach the history.
        let page = mapper
            .list_messages(&ctx(), &thread.id, ListMessagesParams::default())
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 1);
    }

    #[tokio::test]
    async fn list_reports_has_more() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        for i in 0..3 {
            mapper
                .create_message(&ctx(), &thread.id, user_message(&format!("m{i}")))
                .await
                .unwrap();
        }

        let params = ListMessagesParams {
            limit: Some("2".into()),
            ..ListMessagesParams::default()
        };
        let list = mapper.list_messages(&ctx(), &thread.id, params).await.unwrap();
        assert_eq!(list.messages.len(), 2);
        assert!(list.has_more);
        assert_eq!(list.last_id.as_deref(), Some(list.messages[1].id.as_str()));
    }

    #[tokio::test]
    async fn retrieve_message_errors() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        assert!(matches!(
            mapper.retrieve_message(&ctx(), &thread.id, "nope").await,
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            mapper
                .retrieve_message(&ctx(), &thread.id, &Uuid::new_v4().to_string())
                .await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn run_steps_agent_and_reports_completed() {
        let mapper = mapper();
        let thread = mapper
            .create_thread(&ctx(), CreateThreadRequest::default())
            .await
            .unwrap();
        mapper
            .create_message(&ctx(), &thread.id, user_message("hello"))
            .await
            .unwrap();

        let run = mapper
            .create_run(
                &ctx(),
                &thread.id,
                CreateRunRequest {
                    instructions: Some("answer briefly".into()),
                    ..CreateRunRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(run.status, "completed");
        assert_eq!(run.expires_at, run.created_at);
        assert_eq!(run.thread_id, thread.id);
        assert_eq!(run.assistant_id, DEFAULT_ASSISTANT_ID);
        assert_eq!(run.model, AgentDefaults::default().model);
        assert_eq!(run.instructions.as_deref(), Some("answer briefly"));

        let list = mapper
            .list_messages(&ctx(), &thread.id, ListMessagesParams::default())
            .await
            .unwrap();
        assert_eq!(list.messages.len(), 2);
        assert_eq!(list.messages[0].text(), "hello");
        assert_eq!(list.messages[1].role, "assistant");
    }
}
