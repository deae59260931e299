//! 语音转写能力 - 能力接口层
//!
//! 转写引擎（浏览器 SpeechRecognition、本地 STT 等）由表现层持有；
//! 编排器只消费修剪后的最终文本，从不管理麦克风生命周期

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::warn;

/// 转写事件
///
/// Interim 片段仅用于界面回显，提交回答时只采纳 Final 片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// 中间结果（可能被后续结果覆盖）
    Interim(String),
    /// 最终结果片段
    Final(String),
    /// 识别错误
    Error(String),
}

/// 识别器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    Idle,
    Listening,
    Error,
}

/// 语音转写能力
///
/// 一次 `start` 到事件流结束为一轮监听；
/// 在提交之前 `stop` 会丢弃未提交的转写内容，已提交的记录不受影响
#[async_trait]
pub trait Transcriber: Send {
    /// 开始监听
    async fn start(&mut self) -> anyhow::Result<()>;

    /// 取出下一条转写事件，流结束返回 None
    async fn next_event(&mut self) -> Option<TranscriptEvent>;

    /// 停止监听，丢弃未提交的转写内容
    async fn stop(&mut self);

    fn state(&self) -> RecognizerState;
}

/// 从事件流中收集最终文本
///
/// 只累积 Final 片段，拼接并修剪空白；没有可用内容时返回 None
pub async fn collect_final_text<S>(mut events: S) -> Option<String>
where
    S: Stream<Item = TranscriptEvent> + Unpin,
{
    let mut finals: Vec<String> = Vec::new();

    while let Some(event) = events.next().await {
        match event {
            TranscriptEvent::Final(text) => finals.push(text),
            TranscriptEvent::Interim(_) => {}
            TranscriptEvent::Error(message) => {
                warn!("⚠️ 语音识别错误: {}", message);
            }
        }
    }

    let joined = finals.join(" ").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// 驱动一轮完整监听并返回最终文本
pub async fn listen_once<T>(transcriber: &mut T) -> anyhow::Result<Option<String>>
where
    T: Transcriber + ?Sized,
{
    transcriber.start().await?;

    let mut finals: Vec<String> = Vec::new();
    while let Some(event) = transcriber.next_event().await {
        match event {
            TranscriptEvent::Final(text) => finals.push(text),
            TranscriptEvent::Interim(_) => {}
            TranscriptEvent::Error(message) => {
                warn!("⚠️ 语音识别错误: {}", message);
            }
        }
    }

    transcriber.stop().await;

    let joined = finals.join(" ").trim().to_string();
    Ok(if joined.is_empty() { None } else { Some(joined) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_only_final_fragments() {
        let events = stream::iter(vec![
            TranscriptEvent::Interim("we are".to_string()),
            TranscriptEvent::Final("we are building".to_string()),
            TranscriptEvent::Interim("a shared".to_string()),
            TranscriptEvent::Final("a shared parking marketplace".to_string()),
        ]);

        let text = collect_final_text(events).await;
        assert_eq!(
            text.as_deref(),
            Some("we are building a shared parking marketplace")
        );
    }

    #[tokio::test]
    async fn test_collect_empty_stream() {
        let events = stream::iter(Vec::<TranscriptEvent>::new());
        assert_eq!(collect_final_text(events).await, None);
    }

    #[tokio::test]
    async fn test_collect_whitespace_only_is_none() {
        let events = stream::iter(vec![
            TranscriptEvent::Final("   ".to_string()),
            TranscriptEvent::Final("".to_string()),
        ]);
        assert_eq!(collect_final_text(events).await, None);
    }

    #[tokio::test]
    async fn test_collect_survives_error_events() {
        let events = stream::iter(vec![
            TranscriptEvent::Error("no-speech".to_string()),
            TranscriptEvent::Final("our burn rate is low".to_string()),
        ]);
        assert_eq!(
            collect_final_text(events).await.as_deref(),
            Some("our burn rate is low")
        );
    }
}
