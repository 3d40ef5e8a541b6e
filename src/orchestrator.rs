use tracing::{debug, instrument};

use crate::{
    client::OllamaClient,
    models::{base::Message, chat::ChatOptions, errors::ClientError},
    tools::{Tool, ToolHandler},
    util::truncate_for_log,
};

impl OllamaClient {
    /// Sends a conversation and transparently resolves one round of tool
    /// calls.
    ///
    /// The tool definitions and `tool_choice: "auto"` are injected into a
    /// private copy of `options`; the caller's values are untouched. When
    /// the first reply requests tool invocations, each one is executed
    /// through `handler` sequentially (in reply order, awaited one by one),
    /// the outputs are appended as tool messages, and a second round-trip,
    /// this time without the tool schema, produces the returned reply. A
    /// first reply without tool calls is returned after a single round-trip.
    ///
    /// The automation is a single hop: a second reply that itself requests
    /// tools is returned as-is, and the caller decides whether to re-invoke.
    ///
    /// A handler failure is not caught here; it aborts the remaining calls
    /// in the batch and the second round-trip.
    #[instrument(name = "chat.with_tools", skip_all, fields(model = %model))]
    pub async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
        handler: &ToolHandler,
        options: ChatOptions,
    ) -> Result<Message, ClientError> {
        let (_, reply) = self
            .resolve_tool_calls(model, messages, tools, handler, options)
            .await?;
        Ok(reply)
    }

    /// Like [`OllamaClient::chat_with_tools`], but returns the extended
    /// conversation: the input messages, the assistant reply that requested
    /// tools (tool_calls intact), one tool message per executed call, and
    /// the final reply. The caller's message slice is never modified.
    pub async fn chat_with_tools_history(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
        handler: &ToolHandler,
        options: ChatOptions,
    ) -> Result<Vec<Message>, ClientError> {
        let (conversation, _) = self
            .resolve_tool_calls(model, messages, tools, handler, options)
            .await?;
        Ok(conversation)
    }

    async fn resolve_tool_calls(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
        handler: &ToolHandler,
        options: ChatOptions,
    ) -> Result<(Vec<Message>, Message), ClientError> {
        let options = options.tools(tools.to_vec()).tool_choice("auto");

        let first = self.chat(model, messages, options).await?;
        let mut conversation = messages.to_vec();
        conversation.push(first.clone());

        let Some(calls) = first.tool_calls.as_deref() else {
            debug!("no tool calls requested, single round-trip");
            return Ok((conversation, first));
        };

        for call in calls {
            tracing::info!(
                target: "tool",
                tool = %call.function.name,
                id = ?call.id,
                args = %truncate_for_log(&call.function.arguments.to_string(), 512),
                "executing tool call",
            );

            let output = handler(
                call.function.name.clone(),
                call.function.arguments.clone(),
            )
            .await
            .map_err(ClientError::Tool)?;

            let call_id = call
                .id
                .clone()
                .unwrap_or_else(|| call.function.name.clone());
            conversation.push(Message::tool_named(output, call_id, &call.function.name));
        }

        // second round-trip resends the conversation without the tool schema
        let reply = self
            .chat(model, &conversation, ChatOptions::default())
            .await?;
        conversation.push(reply.clone());

        Ok((conversation, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ClientConfig,
        models::base::Role,
        tools::{ToolBuilder, ToolExecutionError},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn weather_tool() -> Tool {
        ToolBuilder::new()
            .function_name("get_weather")
            .function_description("Returns the current weather for a city")
            .add_required("city", "string", "City name")
            .build()
            .expect("valid tool")
    }

    fn weather_handler() -> ToolHandler {
        Arc::new(|name, args| {
            Box::pin(async move {
                assert_eq!(name, "get_weather");
                assert_eq!(args, json!({"city": "Lyon"}));
                Ok("22C".to_string())
            })
        })
    }

    fn failing_handler() -> ToolHandler {
        Arc::new(|_, _| {
            Box::pin(async { Err(ToolExecutionError::ExecutionFailed("boom".into())) })
        })
    }

    async fn client_for(server: &MockServer) -> OllamaClient {
        ClientConfig::default()
            .base_url(server.uri())
            .build()
            .expect("client builds")
    }

    fn tool_call_reply() -> Value {
        json!({
            "model": "llama3",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "1",
                    "function": {
                        "name": "get_weather",
                        "arguments": {"city": "Lyon"},
                        "index": 0.0
                    }
                }]
            },
            "done": true
        })
    }

    fn final_reply() -> Value {
        json!({
            "model": "llama3",
            "created_at": "2024-01-01T00:00:01Z",
            "message": {"role": "assistant", "content": "It is 22C in Lyon."},
            "done": true
        })
    }

    #[tokio::test]
    async fn resolves_tool_calls_across_two_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = vec![Message::user("What is the weather in Lyon?")];
        let reply = client
            .chat_with_tools(
                "llama3",
                &messages,
                &[weather_tool()],
                &weather_handler(),
                ChatOptions::default(),
            )
            .await
            .expect("orchestration succeeds");

        assert_eq!(reply.content.as_deref(), Some("It is 22C in Lyon."));

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 2);

        // first request carries the tool schema and tool_choice
        let first: Value = serde_json::from_slice(&requests[0].body).expect("json body");
        assert_eq!(first["tool_choice"], "auto");
        assert_eq!(first["tools"][0]["function"]["name"], "get_weather");

        // second request resends the conversation without the schema
        let second: Value = serde_json::from_slice(&requests[1].body).expect("json body");
        assert!(second.get("tools").is_none());
        assert!(second.get("tool_choice").is_none());
        assert_eq!(second["keep_alive"], 5);
        assert_eq!(second["stream"], false);

        let sent = second["messages"].as_array().expect("messages array");
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["role"], "user");
        assert_eq!(sent[1]["role"], "assistant");
        assert_eq!(sent[1]["tool_calls"][0]["id"], "1");
        // the index compatibility fix: never echoed back
        assert!(sent[1]["tool_calls"][0]["function"].get("index").is_none());
        assert_eq!(
            sent[2],
            json!({
                "role": "tool",
                "content": "22C",
                "tool_call_id": "1",
                "name": "get_weather"
            })
        );
    }

    #[tokio::test]
    async fn reply_without_tool_calls_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = vec![Message::user("Hello")];
        let reply = client
            .chat_with_tools(
                "llama3",
                &messages,
                &[weather_tool()],
                &weather_handler(),
                ChatOptions::default(),
            )
            .await
            .expect("orchestration succeeds");

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content.as_deref(), Some("It is 22C in Lyon."));
    }

    #[tokio::test]
    async fn handler_failure_aborts_before_second_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = vec![Message::user("What is the weather in Lyon?")];
        let result = client
            .chat_with_tools(
                "llama3",
                &messages,
                &[weather_tool()],
                &failing_handler(),
                ChatOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(ClientError::Tool(_))));

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn history_variant_returns_full_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = vec![Message::user("What is the weather in Lyon?")];
        let conversation = client
            .chat_with_tools_history(
                "llama3",
                &messages,
                &[weather_tool()],
                &weather_handler(),
                ChatOptions::default(),
            )
            .await
            .expect("orchestration succeeds");

        // user, assistant tool request, tool output, final reply
        assert_eq!(conversation.len(), 4);
        assert_eq!(messages.len(), 1);
        assert_eq!(conversation[1].role, Role::Assistant);
        assert!(conversation[1].tool_calls.is_some());
        assert_eq!(conversation[2].role, Role::Tool);
        assert_eq!(conversation[2].tool_call_id.as_deref(), Some("1"));
        assert_eq!(
            conversation[3].content.as_deref(),
            Some("It is 22C in Lyon.")
        );
    }

    #[tokio::test]
    async fn missing_call_id_falls_back_to_function_name() {
        let first_reply = json!({
            "model": "llama3",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {"name": "get_weather", "arguments": {"city": "Lyon"}}
                }]
            },
            "done": true
        });

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first_reply))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let conversation = client
            .chat_with_tools_history(
                "llama3",
                &[Message::user("Weather in Lyon?")],
                &[weather_tool()],
                &weather_handler(),
                ChatOptions::default(),
            )
            .await
            .expect("orchestration succeeds");

        assert_eq!(conversation[2].tool_call_id.as_deref(), Some("get_weather"));
    }

    #[tokio::test]
    async fn tool_calls_execute_sequentially_in_reply_order() {
        let first_reply = json!({
            "model": "llama3",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"id": "a", "function": {"name": "first", "arguments": {}}},
                    {"id": "b", "function": {"name": "second", "arguments": {}}}
                ]
            },
            "done": true
        });

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first_reply))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
            .mount(&server)
            .await;

        let handler: ToolHandler =
            Arc::new(|name, _| Box::pin(async move { Ok(format!("ran {name}")) }));

        let client = client_for(&server).await;
        let conversation = client
            .chat_with_tools_history(
                "llama3",
                &[Message::user("go")],
                &[],
                &handler,
                ChatOptions::default(),
            )
            .await
            .expect("orchestration succeeds");

        assert_eq!(conversation[2].content.as_deref(), Some("ran first"));
        assert_eq!(conversation[2].tool_call_id.as_deref(), Some("a"));
        assert_eq!(conversation[3].content.as_deref(), Some("ran second"));
        assert_eq!(conversation[3].tool_call_id.as_deref(), Some("b"));
    }
}
