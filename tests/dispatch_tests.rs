
use quiz_assistant::clients::{MockClient, MockResponse};
use quiz_assistant::core::{LowLevelClient, Role};
use quiz_assistant::provider::{CannedQuizProvider, LlmQuizProvider, QuizProvider};
use quiz_assistant::quiz::{GradeLevel, Language, QuestionType, QuizSpec};
use quiz_assistant::{DispatchOutcome, Dispatcher, QuizError};
use serde_json::json;
use test_utils::{sample_quiz, SAMPLE_MODEL_OUTPUT};

fn fractions_spec() -> QuizSpec {
    QuizSpec {
        topic: "fractions".into(),
        grade_level: GradeLevel::G4To6,
        num_questions: 3,
        question_type: QuestionType::Mix,
        language: Language::Ru,
    }
}

#[tokio::test]
async fn text_reply_is_passed_through() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::Text(
        "Which grade is the quiz for?".into(),
    )]);
    let dispatcher = Dispatcher::new(client, CannedQuizProvider::new(sample_quiz()));

    let outcome = dispatcher.handle("make a quiz").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Reply("Which grade is the quiz for?".into()));
    assert!(dispatcher.provider().requests().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_a_soft_failure() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::function_call(
        "grade_homework",
        json!({}),
    )]);
    let dispatcher = Dispatcher::new(client, CannedQuizProvider::new(sample_quiz()));

    let outcome = dispatcher.handle("grade this").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::UnknownTool("grade_homework".into()));
    assert_eq!(outcome.message().unwrap(), "Tool not found: grade_homework");
    assert!(dispatcher.provider().requests().is_empty());
}

#[tokio::test]
async fn quiz_request_is_validated_and_generated() {
    let (client, handle) = MockClient::with_responses(vec![MockResponse::function_call(
        "generate_quiz",
        json!({"topic": "fractions", "grade_level": "4-6", "num_questions": 5}),
    )]);
    let dispatcher = Dispatcher::new(client, CannedQuizProvider::new(sample_quiz()));

    let outcome = dispatcher.handle("Quiz on fractions for 4-6, 5 questions").await.unwrap();

    let DispatchOutcome::Quiz { spec, quiz } = outcome else {
        panic!("expected a quiz");
    };
    assert_eq!(spec.num_questions, 5);
    assert_eq!(spec.question_type, QuestionType::Mix);
    assert_eq!(spec.language, Language::Ru);
    assert_eq!(quiz, sample_quiz());
    assert_eq!(dispatcher.provider().requests(), vec![spec]);

    let requests = handle.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].functions[0].name, "generate_quiz");
    assert_eq!(requests[0].temperature, Some(0.0));
    assert_eq!(requests[0].messages[0].role, Role::System);
    assert_eq!(requests[0].user_text(), Some("Quiz on fractions for 4-6, 5 questions"));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_provider() {
    let cases = [
        (json!({"topic": "fractions", "grade_level": "4-6", "num_questions": 50}), "num_questions"),
        (json!({"topic": "fractions", "grade_level": "first", "num_questions": 5}), "grade_level"),
        (json!({"grade_level": "4-6", "num_questions": 5}), "topic"),
    ];
    for (args, field) in cases {
        let (client, _handle) = MockClient::with_responses(vec![MockResponse::function_call("generate_quiz", args)]);
        let dispatcher = Dispatcher::new(client, CannedQuizProvider::new(sample_quiz()));

        match dispatcher.handle("quiz please").await {
            Err(QuizError::Validation(e)) => assert_eq!(e.field, field),
            other => panic!("expected a validation error for {field}, got {other:?}"),
        }
        assert!(dispatcher.provider().requests().is_empty());
    }
}

#[tokio::test]
async fn unparsable_arguments_are_a_validation_error() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::FunctionCall {
        name: "generate_quiz".into(),
        arguments: "{topic: fractions".into(),
    }]);
    let dispatcher = Dispatcher::new(client, CannedQuizProvider::empty());

    match dispatcher.handle("quiz").await {
        Err(QuizError::Validation(e)) => assert_eq!(e.field, "arguments"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn model_errors_propagate() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::Error("boom".into())]);
    let dispatcher = Dispatcher::new(client, CannedQuizProvider::new(sample_quiz()));

    assert!(matches!(dispatcher.handle("quiz").await, Err(QuizError::Ai(_))));
}

#[tokio::test]
async fn llm_provider_parses_model_output() {
    let (client, handle) = MockClient::with_responses(vec![MockResponse::Text(SAMPLE_MODEL_OUTPUT.into())]);
    let provider = LlmQuizProvider::new(client);

    let quiz = provider.generate(&fractions_spec()).await.unwrap();
    assert_eq!(quiz.items.len(), 3);

    let requests = handle.requests();
    let request = &requests[0];
    assert!(request.json_mode);
    assert_eq!(request.temperature, Some(0.2));
    assert!(request.functions.is_empty());
    let prompt = request.user_text().unwrap();
    assert!(prompt.contains("topic: fractions"));
    assert!(prompt.contains("grade_level: 4-6"));
    assert!(prompt.contains("num_questions: 3"));
    assert!(prompt.contains("question_type: mix"));
    assert!(prompt.contains("language: ru"));
    assert!(prompt.contains("answer_key"), "schema guidance should describe the quiz");
}

#[tokio::test]
async fn llm_provider_rejects_malformed_output() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::Text(
        r#"{"topic": "fractions", "grade_level": "4-6"}"#.into(),
    )]);
    let provider = LlmQuizProvider::new(client);

    assert!(matches!(provider.generate(&fractions_spec()).await, Err(QuizError::MalformedQuiz(_))));
}

#[tokio::test]
async fn full_pipeline_through_the_model() {
    let (client, _handle) = MockClient::with_responses(vec![
        MockResponse::function_call(
            "generate_quiz",
            json!({"topic": "дроби", "grade_level": "4-6", "num_questions": 3, "language": "ru"}),
        ),
        MockResponse::Text(SAMPLE_MODEL_OUTPUT.into()),
    ]);
    let dispatcher = Dispatcher::new(client.clone(), LlmQuizProvider::new(client));

    match dispatcher.handle("Сделай квиз по дробям для 4-6 на 3 вопроса").await.unwrap() {
        DispatchOutcome::Quiz { spec, quiz } => {
            assert_eq!(spec.topic, "дроби");
            assert_eq!(quiz.topic, "Дроби");
        }
        other => panic!("expected a quiz, got {other:?}"),
    }
}

#[tokio::test]
async fn boxed_client_can_be_shared() {
    let (client, handle) = MockClient::with_responses(vec![
        MockResponse::function_call(
            "generate_quiz",
            json!({"topic": "fractions", "grade_level": "4-6", "num_questions": 3}),
        ),
        MockResponse::Text(SAMPLE_MODEL_OUTPUT.into()),
    ]);
    let client: Box<dyn LowLevelClient> = Box::new(client);
    let dispatcher = Dispatcher::new(client.clone(), LlmQuizProvider::new(client));

    let outcome = dispatcher.handle("quiz on fractions").await.unwrap();

    assert!(matches!(outcome, DispatchOutcome::Quiz { .. }));
    assert_eq!(handle.requests().len(), 2);
}
