/*!
 * Tests for the whole-document and line-by-line fallback chain
 */

use anyhow::Result;
use std::sync::Arc;

use doctrans::errors::{ProviderError, TranslationError};
use doctrans::providers::mock::MockProvider;
use doctrans::providers::TranslationBackend;
use doctrans::translation::core::{ServiceSettings, TranslationService};
use doctrans::translation::document::{DocumentKind, RequestMode};
use doctrans::translation::{FallbackOrchestrator, SourceDocument, TranslationTier};

use crate::common;

fn document(content: &str) -> SourceDocument {
    SourceDocument::from_content("ko/guide.md", content, &["SUMMARY.md".to_string()])
}

/// Documents without Korean text are copied without calling a backend
#[tokio::test]
async fn test_translate_document_withoutKorean_shouldNotCallBackends() -> Result<()> {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let content = "# Already English\n\n```yaml\nname: agent\n```\n";
    let outcome = orchestrator.translate_document(&document(content)).await?;

    assert_eq!(outcome.tier, TranslationTier::Unchanged);
    assert_eq!(outcome.text, content);
    assert_eq!(mock.call_count(), 0);
    Ok(())
}

/// The first answering backend translates the whole document, post-processed
#[tokio::test]
async fn test_translate_document_withWorkingBackend_shouldTranslateWhole() -> Result<()> {
    let mock = MockProvider::replacing(&[("시작하기", "getting started"), ("소개입니다", "introduction")]);
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let outcome = orchestrator
        .translate_document(&document("# 시작하기\n\nsowonflow 소개입니다.\n"))
        .await?;

    assert_eq!(
        outcome.tier,
        TranslationTier::Document {
            backend: "mock".to_string()
        }
    );
    assert_eq!(outcome.text, "# Getting started\n\nSowonFlow introduction.\n");
    assert_eq!(mock.call_count(), 1);
    assert_eq!(mock.document_call_count(), 1);
    Ok(())
}

/// Later backends answer when earlier ones fail or return nothing
#[tokio::test]
async fn test_translate_document_withFailingFirstBackends_shouldUseNextOne() -> Result<()> {
    let first = MockProvider::failing(ProviderError::UpstreamError {
        status_code: 503,
        body: "unavailable".to_string(),
    })
    .named("first");
    let second = MockProvider::empty().named("second");
    let third = MockProvider::replacing(&[("안녕", "Hello")]).named("third");
    let orchestrator = common::orchestrator_with(&[first.clone(), second.clone(), third], None);

    let outcome = orchestrator.translate_document(&document("안녕\n")).await?;

    assert_eq!(
        outcome.tier,
        TranslationTier::Document {
            backend: "third".to_string()
        }
    );
    assert_eq!(outcome.text, "Hello\n");
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 1);
    Ok(())
}

/// A whole-document answer that lost a code fence is rejected for the line tier
#[tokio::test]
async fn test_translate_document_withLostFence_shouldFallBackToLines() -> Result<()> {
    let mock = MockProvider::replacing(&[("```js\n", ""), ("제목", "Title"), ("본문", "Body")]);
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let source = "# 제목\n\n```js\nconst a = 1;\n```\n\n본문\n";
    let outcome = orchestrator.translate_document(&document(source)).await?;

    assert_eq!(outcome.tier, TranslationTier::Lines);
    assert_eq!(outcome.text, "# Title\n\n```js\nconst a = 1;\n```\n\nBody\n");
    assert_eq!(outcome.lines_translated, 2);
    assert_eq!(outcome.lines_kept, 0);
    assert_eq!(mock.document_call_count(), 1);
    assert_eq!(mock.call_count(), 3);
    Ok(())
}

/// With structure checks off the same answer is accepted
#[tokio::test]
async fn test_translate_document_withStructureCheckDisabled_shouldAcceptAnswer() -> Result<()> {
    let mock = MockProvider::replacing(&[("```js\n", ""), ("본문", "Body")]);
    let settings = ServiceSettings {
        verify_structure: false,
        ..ServiceSettings::default().without_delay()
    };
    let hosted = vec![Arc::new(mock.clone()) as Arc<dyn TranslationBackend>];
    let orchestrator = FallbackOrchestrator::new(TranslationService::with_backends(hosted, None, settings));

    let outcome = orchestrator
        .translate_document(&document("```js\nx\n```\n본문\n"))
        .await?;

    assert!(matches!(outcome.tier, TranslationTier::Document { .. }));
    assert_eq!(outcome.text, "x\n```\nBody\n");
    Ok(())
}

/// YAML keys are never sent and quoting is restored around the translated value
#[tokio::test]
async fn test_translate_document_withYamlBlock_shouldTranslateValuesOnly() -> Result<()> {
    let mock = MockProvider::replacing(&[("테스트", "Test"), ("값", "value"), ("설명", "description")]).failing_documents();
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let source = "```yaml\nname: \"테스트\"\n설명: 값\nmodel: gpt-4o\n```";
    let outcome = orchestrator.translate_document(&document(source)).await?;

    assert_eq!(outcome.text, "```yaml\nname: \"Test\"\n설명: value\nmodel: gpt-4o\n```");
    let line_texts: Vec<String> = mock
        .calls()
        .into_iter()
        .filter(|request| !request.is_document())
        .map(|request| request.text)
        .collect();
    assert_eq!(line_texts, vec!["테스트", "값"]);
    Ok(())
}

/// Inline YAML comments stay comments and are never sent
#[tokio::test]
async fn test_translate_document_withYamlInlineComment_shouldKeepCommentOutsideValue() -> Result<()> {
    let mock = MockProvider::replacing(&[("테스트", "Test")]).failing_documents();
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let source = "```yaml\nname: 테스트 # 주석\n```";
    let outcome = orchestrator.translate_document(&document(source)).await?;

    assert_eq!(outcome.text, "```yaml\nname: Test # 주석\n```");
    let line_texts: Vec<String> = mock
        .calls()
        .into_iter()
        .filter(|request| !request.is_document())
        .map(|request| request.text)
        .collect();
    assert_eq!(line_texts, vec!["테스트"]);
    Ok(())
}

/// CRLF endings and markdown hard breaks survive line-by-line translation
#[tokio::test]
async fn test_translate_document_withTrailingWhitespace_shouldKeepLineEndings() -> Result<()> {
    let mock = MockProvider::replacing(&[("안녕", "Hello"), ("세계", "World"), ("다음", "Next")]).failing_documents();
    let orchestrator = common::orchestrator_with(&[mock], None);

    let crlf = "안녕\r\n```\nx\r\n```\r\n세계\r\n";
    let outcome = orchestrator.translate_document(&document(crlf)).await?;
    assert_eq!(outcome.text, "Hello\r\n```\nx\r\n```\r\nWorld\r\n");

    let hard_break = "안녕  \n다음";
    let outcome = orchestrator.translate_document(&document(hard_break)).await?;
    assert_eq!(outcome.text, "Hello  \nNext");
    Ok(())
}

/// Lines that are not translatable come out byte-identical
#[tokio::test]
async fn test_translate_document_withStructuralLines_shouldKeepThemIdentical() -> Result<()> {
    let mock = MockProvider::working().failing_documents();
    let orchestrator = common::orchestrator_with(&[mock], None);

    let source = "## 개요\n\
                  \n\
                  ![구조도](./images/architecture.png)\n\
                  [설정 가이드](./config.md)를 먼저 읽으세요.\n\
                  https://docs.example.com/시작\n\
                  ---\n\
                  ```python\n\
                  # 한국어 주석\n\
                  print(\"안녕\")\n\
                  ```\n\
                  \x20\x20들여쓴 설명입니다.\n";
    let outcome = orchestrator.translate_document(&document(source)).await?;

    let source_lines: Vec<&str> = source.split('\n').collect();
    let output_lines: Vec<&str> = outcome.text.split('\n').collect();
    assert_eq!(source_lines.len(), output_lines.len());

    assert_eq!(output_lines[0], "[EN] ## 개요");
    assert_eq!(output_lines[10], "  [EN] 들여쓴 설명입니다.");
    for index in 1..=9 {
        assert_eq!(output_lines[index], source_lines[index], "line {}", index);
    }
    assert_eq!(outcome.lines_translated, 2);
    Ok(())
}

/// Translated lines are written in source order
#[tokio::test]
async fn test_translate_document_withManyLines_shouldPreserveOrder() -> Result<()> {
    let mock = MockProvider::working().failing_documents().with_delay(5);
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let lines: Vec<String> = (1..=8).map(|i| format!("{}번째 문장입니다.", i)).collect();
    let outcome = orchestrator.translate_document(&document(&lines.join("\n"))).await?;

    let expected: Vec<String> = lines.iter().map(|line| format!("[EN] {}", line)).collect();
    assert_eq!(outcome.text, expected.join("\n"));

    let sent: Vec<String> = mock.calls().into_iter().skip(1).map(|request| request.text).collect();
    assert_eq!(sent, lines);
    Ok(())
}

/// With every backend failing the original text is kept
#[tokio::test]
async fn test_translate_document_withAllBackendsFailing_shouldKeepOriginal() -> Result<()> {
    let orchestrator = common::orchestrator_with(
        &[
            MockProvider::unauthenticated(),
            MockProvider::failing(ProviderError::RequestFailed("offline".to_string())),
        ],
        Some(doctrans::providers::cli_tool::CliTool::new(common::MISSING_TOOL, vec![])),
    );

    let source = "# 안녕\n\n일반 텍스트입니다.\n\n```\ncode\n```\n";
    let outcome = orchestrator.translate_document(&document(source)).await?;

    assert_eq!(outcome.tier, TranslationTier::Lines);
    assert_eq!(outcome.text, source);
    assert_eq!(outcome.lines_translated, 0);
    assert_eq!(outcome.lines_kept, 2);
    Ok(())
}

/// The command line tool translates lines the hosted backends could not
#[cfg(unix)]
#[tokio::test]
async fn test_translate_document_withCliTool_shouldUseItAfterHostedBackends() -> Result<()> {
    use doctrans::providers::cli_tool::CliTool;

    let tool = CliTool::new("sed", vec!["s/안녕하세요/Hello/".to_string()]);
    let orchestrator = common::orchestrator_with(&[MockProvider::unauthenticated()], Some(tool));

    let outcome = orchestrator
        .translate_document(&document("안녕하세요\n반갑습니다\n"))
        .await?;

    assert_eq!(outcome.tier, TranslationTier::Lines);
    // sed leaves the second line alone, which counts as kept
    assert_eq!(outcome.text, "Hello\n반갑습니다\n");
    assert_eq!(outcome.lines_translated, 1);
    assert_eq!(outcome.lines_kept, 1);
    Ok(())
}

/// Tables of contents are sent with their own request kind
#[tokio::test]
async fn test_translate_document_withSummaryFile_shouldSendTableOfContents() -> Result<()> {
    let mock = MockProvider::replacing(&[("소개", "Introduction")]);
    let orchestrator = common::orchestrator_with(&[mock.clone()], None);

    let toc = SourceDocument::from_content("ko/SUMMARY.md", "- [소개](intro.md)\n", &["SUMMARY.md".to_string()]);
    let outcome = orchestrator.translate_document(&toc).await?;

    assert_eq!(outcome.text, "- [Introduction](intro.md)\n");
    assert_eq!(mock.calls()[0].mode, RequestMode::Document(DocumentKind::TableOfContents));
    Ok(())
}

/// Files are read, translated and written to the target path
#[tokio::test]
async fn test_translate_file_withSourceOnDisk_shouldWriteTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "ko/a.md", "안녕\n")?;
    let target = temp_dir.path().join("en/a.md");
    let orchestrator = common::orchestrator_with(&[MockProvider::replacing(&[("안녕", "Hello")])], None);

    orchestrator.translate_file(&source, &target).await?;

    assert_eq!(common::read_test_file(temp_dir.path(), "en/a.md")?, "Hello\n");
    Ok(())
}

/// A missing source is reported as such
#[tokio::test]
async fn test_translate_file_withMissingSource_shouldReturnFileNotFound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let orchestrator = common::orchestrator_with(&[MockProvider::working()], None);

    let err = orchestrator
        .translate_file(temp_dir.path().join("ko/missing.md"), temp_dir.path().join("en/missing.md"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::FileNotFound(_)));
    assert!(!temp_dir.path().join("en/missing.md").exists());
    Ok(())
}
