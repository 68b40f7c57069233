// crates/scope_tokenizer/tests/ruby.rs

use anyhow::Result;
use scope_tokenizer::{GrammarRegistry, Language, LexState, ScopeTag, Token};

/// Tokenizes `source` line by line, carrying state forward.
fn tokenize_file(source: &str) -> Result<Vec<(String, Vec<Token>)>> {
    let ruby = GrammarRegistry::global().load(Language::Ruby)?;
    let mut state: Option<LexState> = None;
    let mut out = Vec::new();
    for line in source.lines() {
        let tokenized = ruby.tokenize_line(line, state.as_ref())?;
        state = Some(tokenized.state);
        out.push((line.to_string(), tokenized.tokens));
    }
    Ok(out)
}

fn keyword_words(line: &str, tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| t.tags.contains(ScopeTag::Keyword) && !t.is_comment_or_string())
        .map(|t| t.text(line).to_string())
        .collect()
}

#[test]
fn ruby_file_keeps_keywords_out_of_literals() -> Result<()> {
    let source = "\
class Greeter
  # end of comment
  def hello(name)
    msg = <<~TXT
      if this were code it would end
    TXT
    puts \"end\" if name
  end
=begin
  def ghost
  end
=end
end";
    let lines = tokenize_file(source)?;
    let keywords: Vec<Vec<String>> = lines
        .iter()
        .map(|(line, tokens)| keyword_words(line, tokens))
        .collect();

    assert_eq!(keywords[0], ["class"]);
    assert!(keywords[1].is_empty());
    assert_eq!(keywords[2], ["def"]);
    assert!(keywords[4].is_empty(), "heredoc body: {:?}", keywords[4]);
    assert!(keywords[5].is_empty());
    assert!(keywords[6].contains(&"if".to_string()));
    assert!(!keywords[6].contains(&"end".to_string()));
    assert_eq!(keywords[7], ["end"]);
    for doc in 8..=11 {
        assert!(keywords[doc].is_empty(), "line {doc} is documentation");
    }
    assert_eq!(keywords[12], ["end"]);
    Ok(())
}

#[test]
fn every_token_is_rooted_and_in_bounds() -> Result<()> {
    let source = "x = { a: 1, 'b' => [2, 3] }.map { |k, v| \"#{k}=#{v}\" }";
    for (line, tokens) in tokenize_file(source)? {
        let mut last_end = 0;
        for token in &tokens {
            assert_eq!(token.scopes[0], "source.ruby");
            assert!(token.start >= last_end && token.end <= line.len());
            last_end = token.end;
        }
    }
    Ok(())
}

#[test]
fn heredoc_terminator_is_only_confirmed_with_carried_state() -> Result<()> {
    let ruby = GrammarRegistry::global().load(Language::Ruby)?;
    // Without prior state a lone identifier is plain code.
    let cold = ruby.tokenize_line("SQL", None)?;
    assert!(cold.tokens.iter().all(|t| !t.tags.contains(ScopeTag::Heredoc)));

    let lines = tokenize_file("query = <<-SQL\n  select 1\n  SQL")?;
    let (line, tokens) = &lines[2];
    let end = tokens
        .iter()
        .find(|t| t.text(line) == "SQL")
        .expect("terminator token");
    assert!(end.tags.contains_all(&[ScopeTag::Heredoc, ScopeTag::StringEnd]));
    Ok(())
}

#[test]
fn lowercase_heredoc_hides_its_body() -> Result<()> {
    let lines = tokenize_file("def a\n  x = <<eos\nif y\neos\nend")?;
    let keywords: Vec<Vec<String>> = lines
        .iter()
        .map(|(line, tokens)| keyword_words(line, tokens))
        .collect();
    assert_eq!(keywords[0], ["def"]);
    assert!(keywords[2].is_empty(), "heredoc body: {:?}", keywords[2]);
    assert_eq!(keywords[4], ["end"]);
    Ok(())
}

#[test]
fn heredoc_as_call_argument_keeps_the_block_opener() -> Result<()> {
    let lines = tokenize_file("items.each(<<~EOS) do\n  end of text\nEOS\nputs 1")?;
    assert_eq!(keyword_words(&lines[0].0, &lines[0].1), ["do"]);
    assert!(keyword_words(&lines[1].0, &lines[1].1).is_empty());
    let (line, tokens) = &lines[2];
    assert!(tokens
        .iter()
        .any(|t| t.text(line) == "EOS" && t.tags.contains(ScopeTag::StringEnd)));
    Ok(())
}

#[test]
fn character_literals_are_not_brace_tokens() -> Result<()> {
    for (line, tokens) in tokenize_file("open = c == ?{\nshut = c == ?}")? {
        assert!(tokens
            .iter()
            .all(|t| !t.tags.contains_any(&[ScopeTag::ScopeBegin, ScopeTag::ScopeEnd])));
        assert!(tokens.iter().any(|t| t.text(&line).starts_with('?')));
    }
    Ok(())
}
