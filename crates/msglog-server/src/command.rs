use std::collections::HashMap;
use std::str::FromStr;

use axum::http::Method;
use msglog_types::{AttachmentName, MessageId, NewMessage, PageQuery};

use crate::error::{ServerError, ServerResult};

/// A request to the `/` endpoint, selected by its `method` query parameter.
#[derive(Debug, PartialEq)]
pub enum Command {
    AddMessage(NewMessage),
    GetPage(PageQuery),
    GetMessage(MessageId),
    DownloadAttachment {
        message_id: MessageId,
        name: AttachmentName,
    },
}

impl Command {
    pub const ADD_MESSAGE: &'static str = "addMessage";
    pub const GET_PAGE: &'static str = "getPage";
    pub const GET_MESSAGE: &'static str = "getMessage";
    pub const DOWNLOAD_ATTACHMENT: &'static str = "downloadAttachment";

    /// Decode a command from the HTTP verb, query parameters and body.
    pub fn parse(
        http_method: &Method,
        params: &HashMap<String, String>,
        body: &[u8],
        default_page_size: usize,
    ) -> ServerResult<Self> {
        let method = params
            .get("method")
            .ok_or_else(|| ServerError::BadRequest("missing method parameter".into()))?;

        match method.as_str() {
            Self::ADD_MESSAGE => {
                expect_verb(method, http_method, &Method::POST)?;
                let request: NewMessage = serde_json::from_slice(body)
                    .map_err(|e| ServerError::BadRequest(format!("invalid message body: {e}")))?;
                Ok(Self::AddMessage(request))
            }
            Self::GET_PAGE => {
                expect_verb(method, http_method, &Method::GET)?;
                let page_index = optional_param(params, "pageIndex")?.unwrap_or(0);
                let page_size = optional_param(params, "pageSize")?.unwrap_or(default_page_size);
                let mut query = PageQuery::new(page_index, page_size);
                if let Some(search) = params.get("search") {
                    query = query.with_search(search.as_str());
                }
                Ok(Self::GetPage(query))
            }
            Self::GET_MESSAGE => {
                expect_verb(method, http_method, &Method::GET)?;
                Ok(Self::GetMessage(message_id_param(params)?))
            }
            Self::DOWNLOAD_ATTACHMENT => {
                expect_verb(method, http_method, &Method::GET)?;
                let message_id = message_id_param(params)?;
                let raw = required_param(params, "attachmentName")?;
                let name = AttachmentName::parse(raw.as_str())
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                Ok(Self::DownloadAttachment { message_id, name })
            }
            other => Err(ServerError::UnknownMethod(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddMessage(_) => Self::ADD_MESSAGE,
            Self::GetPage(_) => Self::GET_PAGE,
            Self::GetMessage(_) => Self::GET_MESSAGE,
            Self::DownloadAttachment { .. } => Self::DOWNLOAD_ATTACHMENT,
        }
    }
}

fn expect_verb(method: &str, actual: &Method, expected: &Method) -> ServerResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(ServerError::MethodNotAllowed {
            method: method.to_string(),
            expected: expected.to_string(),
        })
    }
}

fn required_param<'a>(params: &'a HashMap<String, String>, key: &str) -> ServerResult<&'a String> {
    params
        .get(key)
        .ok_or_else(|| ServerError::BadRequest(format!("missing {key} parameter")))
}

fn optional_param<T: FromStr>(params: &HashMap<String, String>, key: &str) -> ServerResult<Option<T>> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ServerError::BadRequest(format!("invalid {key}: {raw:?}")))
        })
        .transpose()
}

fn message_id_param(params: &HashMap<String, String>) -> ServerResult<MessageId> {
    let raw = required_param(params, "messageId")?;
    raw.trim()
        .parse::<u64>()
        .map(MessageId::new)
        .map_err(|_| ServerError::BadRequest(format!("invalid messageId: {raw:?}")))
}
