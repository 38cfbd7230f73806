use bias_lite::{
    BiasClassifier, Classification, Error, ExportedModel, TrainerParams, TrainingConfig,
    fit_classifier, model::sigmoid, train,
};
use bias_lite_preprocessing::{
    data_loader::{Example, Label, load_csv_reader},
    pre_processor::VectorizerParams,
};

const TEXTS: [&str; 4] = [
    "great team player",
    "biased against women",
    "excellent performer",
    "women are too emotional",
];
const LABELS: [Label; 4] = [Label::Neutral, Label::Biased, Label::Neutral, Label::Biased];

fn examples() -> Vec<Example> {
    TEXTS
        .iter()
        .zip(LABELS)
        .map(|(text, label)| Example::new(*text, label))
        .collect()
}

fn fitted() -> BiasClassifier {
    fit_classifier(&examples(), VectorizerParams::default(), TrainerParams::default())
        .unwrap()
        .0
}

#[test]
fn test_four_document_scenario() {
    let classifier = fitted();
    let vocab = classifier.vectorizer().vocabulary();
    assert_eq!(vocab.len(), 19);
    assert!(vocab.contains_key("women"));
    assert!(vocab.contains_key("great team"));

    let json = classifier.export().unwrap().to_json().unwrap();
    let artifact = ExportedModel::from_json(&json).unwrap();
    for (text, label) in TEXTS.iter().zip(LABELS) {
        let in_process = classifier.classify(text);
        assert_eq!(Label::from(in_process), label, "{text}");
        assert_eq!(artifact.classify(text, classifier.threshold()), in_process, "{text}");
    }
}

#[test]
fn test_artifact_scores_match_in_process() {
    let classifier = fitted();
    let artifact = classifier.export().unwrap();
    let probes = [
        "great team player",
        "Women are great",
        "WOMEN, women & more women!",
        "too emotional",
        "completely unrelated sentence",
        "",
    ];
    for text in probes {
        let expected = classifier.predict(text).biased_probability();
        let actual = artifact.probability(text);
        assert!((expected - actual).abs() < 1e-9, "{text}: {expected} vs {actual}");
    }
}

#[test]
fn test_empty_text_scores_intercept() {
    let classifier = fitted();
    let intercept = classifier.model().intercept();
    let artifact = classifier.export().unwrap();
    assert!((classifier.predict("").biased_probability() - sigmoid(intercept)).abs() < 1e-12);
    assert!((artifact.probability("") - sigmoid(intercept)).abs() < 1e-12);
    assert!((artifact.probability("?!") - sigmoid(intercept)).abs() < 1e-12);
}

#[test]
fn test_artifact_lengths_agree() {
    let artifact = fitted().export().unwrap();
    let json: serde_json::Value = serde_json::from_str(&artifact.to_json().unwrap()).unwrap();
    let vocab = json["vocab"].as_object().unwrap();
    let idf = json["idf"].as_array().unwrap();
    let coef = json["coef"].as_array().unwrap();
    assert_eq!(vocab.len(), idf.len());
    assert_eq!(vocab.len(), coef.len());
    assert!(json["intercept"].is_number());
    assert_eq!(json["ngram_range"], serde_json::json!([1, 2]));
    assert_eq!(json["use_idf"], serde_json::json!(true));

    let mut indices = vocab.values().map(|v| v.as_u64().unwrap()).collect::<Vec<_>>();
    indices.sort_unstable();
    assert_eq!(indices, (0..vocab.len() as u64).collect::<Vec<_>>());
}

#[test]
fn test_write_and_read_artifact() {
    let classifier = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    classifier.export().unwrap().write_json(&path).unwrap();

    let loaded = ExportedModel::read_json(&path).unwrap();
    assert_eq!(loaded.num_features(), classifier.vectorizer().num_features());
    assert_eq!(loaded.coef(), classifier.model().coef());
    assert_eq!(loaded.intercept(), classifier.model().intercept());
    assert_eq!(loaded.classify("women", 0.5), Classification::Biased);
}

#[test]
fn test_tampered_artifact_is_rejected() {
    let json = fitted().export().unwrap().to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["idf"].as_array_mut().unwrap().pop();
    assert!(ExportedModel::from_json(&value.to_string()).is_err());
}

#[test]
fn test_single_class_training_is_an_error() {
    let only_biased = examples()
        .into_iter()
        .filter(|e| e.label == Label::Biased)
        .collect::<Vec<_>>();
    let err = fit_classifier(&only_biased, VectorizerParams::default(), TrainerParams::default())
        .unwrap_err();
    assert!(matches!(err, Error::SingleClass { label: Label::Biased }));
}

#[test]
fn test_csv_to_artifact() {
    let csv = "\
text,bias_present
great team player,0
excellent performer,0
delivers on time,0
helpful and clear,0
mentors new hires,0
biased against women,1
women are too emotional,1
girls can't lead,1
she is bossy,1
too emotional for management,1
";
    let examples = load_csv_reader(csv.as_bytes()).unwrap();
    let config = TrainingConfig::default();
    let run = train(&examples, &config).unwrap();
    assert_eq!(run.train_size + run.test_size, 10);
    assert_eq!(run.evaluation.support, run.test_size);

    let artifact = run.export().unwrap();
    for example in &examples {
        let expected = run.classifier.predict(&example.text).biased_probability();
        assert!((artifact.probability(&example.text) - expected).abs() < 1e-9);
    }

    let summary = serde_json::to_value(run.summary(&config)).unwrap();
    assert_eq!(summary["config"]["seed"], serde_json::json!(42));
    assert!(summary["evaluation"]["accuracy"].is_number());
}
