use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use ai_jury::services::{
    listen_once, JsonFileStore, LlmEvaluator, RecognizerState, RestStore, ResultStore, Transcriber,
    TranscriptEvent,
};
use ai_jury::{
    utils, Config, DeckDocument, SessionCtx, SessionError, SessionOrchestrator,
};

/// 控制台转写器
///
/// 以标准输入的一行文字代替语音的最终转写文本，每轮监听读取一行
struct ConsoleTranscriber {
    lines: Lines<BufReader<Stdin>>,
    state: RecognizerState,
    delivered: bool,
    eof: bool,
}

impl ConsoleTranscriber {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            state: RecognizerState::Idle,
            delivered: false,
            eof: false,
        }
    }

    fn eof(&self) -> bool {
        self.eof
    }
}

#[async_trait::async_trait]
impl Transcriber for ConsoleTranscriber {
    async fn start(&mut self) -> Result<()> {
        self.delivered = false;
        self.state = RecognizerState::Listening;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TranscriptEvent> {
        if self.delivered {
            return None;
        }
        self.delivered = true;

        match self.lines.next_line().await {
            Ok(Some(line)) => Some(TranscriptEvent::Final(line)),
            Ok(None) => {
                self.eof = true;
                None
            }
            Err(e) => {
                self.state = RecognizerState::Error;
                Some(TranscriptEvent::Error(e.to_string()))
            }
        }
    }

    async fn stop(&mut self) {
        if self.state != RecognizerState::Error {
            self.state = RecognizerState::Idle;
        }
    }

    fn state(&self) -> RecognizerState {
        self.state
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    utils::logging::init();

    // 加载配置
    let config = Config::load();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("dashboard") => run_dashboard(&config).await,
        Some(deck_path) if args.len() >= 4 => {
            run_session(&config, deck_path, &args[2], &args[3]).await
        }
        _ => {
            eprintln!("用法: ai_jury <BP文件> <团队名> <创始人名>");
            eprintln!("      ai_jury dashboard");
            Ok(())
        }
    }
}

fn make_store(config: &Config) -> Arc<dyn ResultStore> {
    match config.store_backend.as_str() {
        "rest" => Arc::new(RestStore::new(config)),
        _ => Arc::new(JsonFileStore::new(&config.data_file)),
    }
}

/// 组织方视角：倒序打印全部评审记录
async fn run_dashboard(config: &Config) -> Result<()> {
    let store = make_store(config);
    let records = store.list_all().await.context("读取评审记录失败")?;

    if records.is_empty() {
        println!("暂无评审记录");
        return Ok(());
    }

    println!("{}", "=".repeat(72));
    println!("评审记录（共 {} 条，新在前）", records.len());
    println!("{}", "=".repeat(72));
    for record in &records {
        println!(
            "{}  {}（{}）  总分 {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.startup_name,
            record.founder_name,
            record.total_score
        );
        println!("  {}", record.feedback_summary);
    }

    Ok(())
}

/// 答辩者视角：完整跑一遍三阶段会话
async fn run_session(
    config: &Config,
    deck_path: &str,
    startup_name: &str,
    founder_name: &str,
) -> Result<()> {
    let bytes = tokio::fs::read(deck_path)
        .await
        .with_context(|| format!("无法读取 BP 文件: {}", deck_path))?;
    let document = DeckDocument::new(bytes, guess_mime(deck_path));

    let evaluator = Arc::new(LlmEvaluator::new(config));
    let store = make_store(config);
    let ctx = SessionCtx::new(startup_name, founder_name);
    let orchestrator = SessionOrchestrator::new(ctx, evaluator, store, config);

    // 阶段一：BP 分析
    let analysis = orchestrator.analyze_deck(&document).await?;
    let total = analysis.investor_questions.len();

    println!("\nBP 分析完成：");
    println!("  问题: {}", analysis.problem);
    println!("  方案: {}", analysis.solution);

    // 阶段二：逐题问答
    let mut transcriber = ConsoleTranscriber::new();

    for (index, question) in analysis.investor_questions.iter().enumerate() {
        println!("\n【问题 {}/{}】{}", index + 1, total, question);

        loop {
            println!("请作答（回车提交）:");
            let answer = listen_once(&mut transcriber).await?.unwrap_or_default();

            if answer.is_empty() && transcriber.eof() {
                anyhow::bail!("输入流已关闭，会话中止");
            }

            match orchestrator.submit_answer(index, &answer).await {
                Ok(outcome) => {
                    println!(
                        "评委点评: {}（得分 {}）",
                        outcome.record.feedback, outcome.record.score
                    );
                    break;
                }
                Err(SessionError::EmptyAnswer) => {
                    println!("回答为空，请重新作答。");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // 阶段三：最终评分（落库失败不影响这里的输出）
    let result = orchestrator.finalize().await?;

    println!("\n{}", "=".repeat(48));
    println!("最终评审结果 - {}", startup_name);
    println!("{}", "=".repeat(48));
    println!("  创新性:         {}", result.scores.innovation);
    println!("  可行性:         {}", result.scores.feasibility);
    println!("  市场潜力:       {}", result.scores.market_potential);
    println!("  表达清晰度:     {}", result.scores.pitch_clarity);
    println!("  问题-方案契合:  {}", result.scores.problem_solution_fit);
    println!("  总分:           {}", result.total_score);
    println!("\n{}", result.feedback_summary);

    Ok(())
}

fn guess_mime(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        _ => "application/octet-stream",
    }
}
