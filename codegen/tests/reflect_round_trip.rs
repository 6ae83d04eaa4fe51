use wsbind_codegen::{
    emitter::{Metadata, RecordingEmitter},
    error::{Error, ReflectError},
    headers::HeaderDirection,
    import::{import, ImportReport},
    mapping::SchemaTypeMapper,
    options::{ImportOptions, ReflectOptions},
    parameters::ParameterDirection,
    reflect::ServiceContract,
    to_wsdl,
};
use wsbind_wsdl::{descriptions::Descriptions, extensions::SoapBindingStyle};

const CALCULATOR: &str = r#"
name = "Calculator"
namespace = "urn:calc"
location = "http://example.com/calc"

[[methods]]
name = "Add"
return_type = "int"
parameters = [
    { name = "a", type = "int" },
    { name = "b", type = "int" },
]
headers = [{ name = "Session", type = "string" }]

[[methods]]
name = "Swap"
return_type = "string"
parameters = [{ name = "x", type = "string", direction = "byref" }]
headers = [{ name = "Session", type = "string", direction = "out" }]

[[methods]]
name = "Fetch"
return_type = "string"
parameters = [
    { name = "id", type = "int" },
    { name = "limit", type = "int", optional = true },
    { name = "total", type = "int", direction = "out" },
]

[[methods]]
name = "Ping"
one_way = true
parameters = [{ name = "note", type = "string" }]
"#;

fn contract(toml: &str) -> ServiceContract {
    toml::from_str(toml).expect("contract")
}

fn round_trip(contract: &ServiceContract, reflect: &ReflectOptions, options: &ImportOptions) -> (ImportReport, RecordingEmitter) {
    let (_, xml) = to_wsdl(contract, reflect).expect("reflect");
    let descriptions: Descriptions = wsbind_wsdl::parse_str(&xml).expect("parse").into();
    let mapper = SchemaTypeMapper::new(&descriptions);

    let mut emitter = RecordingEmitter::new();
    let report = import(&descriptions, &mapper, options, &mut emitter).expect("import");
    (report, emitter)
}

fn directions(pairs: &[(&str, ParameterDirection)]) -> Vec<(String, ParameterDirection)> {
    pairs
        .iter()
        .map(|(name, direction)| (name.to_string(), *direction))
        .collect()
}

#[test]
fn document_wrapped_contract_survives() {
    let contract = contract(CALCULATOR);
    let (report, emitter) = round_trip(&contract, &ReflectOptions::default(), &ImportOptions::default());

    assert_eq!(report.classes, ["CalculatorSoap"]);
    assert!(report.warnings.is_empty(), "{:?}", report.messages);

    let add = report.find_method("CalculatorSoap", "Add").expect("Add");
    assert!(add.wrapped);
    assert_eq!(add.style, Some(SoapBindingStyle::Document));
    assert_eq!(
        add.plan.base_directions(),
        directions(&[("a", ParameterDirection::In), ("b", ParameterDirection::In)])
    );

    let swap = report.find_method("CalculatorSoap", "Swap").expect("Swap");
    assert_eq!(swap.plan.base_directions(), directions(&[("x", ParameterDirection::ByRef)]));
    assert_eq!(
        swap.plan.return_value.as_ref().map(|value| value.name.as_str()),
        Some("SwapResult")
    );

    let fetch = report.find_method("CalculatorSoap", "Fetch").expect("Fetch");
    assert_eq!(
        fetch.plan.base_directions(),
        directions(&[
            ("id", ParameterDirection::In),
            ("limit", ParameterDirection::In),
            ("total", ParameterDirection::Out),
        ])
    );
    assert_eq!(fetch.plan.specified_count(), 1);

    let ping = emitter.find_method("ping").expect("ping");
    assert!(ping.return_type.is_none());
    assert!(ping.metadata.iter().any(|metadata| matches!(
        metadata,
        Metadata::SoapMethod(info) if info.one_way && info.action.as_deref() == Some("urn:calc/Ping")
    )));
}

#[test]
fn header_shared_by_two_methods_is_one_field() {
    let contract = contract(CALCULATOR);
    let (report, emitter) = round_trip(&contract, &ReflectOptions::default(), &ImportOptions::default());

    let fields = emitter.fields().map(|field| field.name.as_str()).collect::<Vec<_>>();
    assert_eq!(fields, ["session"]);

    let add = report.find_method("CalculatorSoap", "Add").expect("Add");
    let swap = report.find_method("CalculatorSoap", "Swap").expect("Swap");
    assert_eq!(add.headers[0].direction, HeaderDirection::IN);
    assert_eq!(swap.headers[0].direction, HeaderDirection::OUT);
    assert_eq!(add.headers[0].field, swap.headers[0].field);
}

#[test]
fn rpc_encoded_contract_survives() {
    let contract = contract(
        r#"
        name = "Calculator"
        namespace = "urn:calc"
        style = "rpc"
        use = "encoded"

        [[methods]]
        name = "Divide"
        return_type = "int"
        parameters = [
            { name = "dividend", type = "int" },
            { name = "divisor", type = "int" },
            { name = "remainder", type = "int", direction = "out" },
        ]
        "#,
    );
    let (report, _) = round_trip(&contract, &ReflectOptions::default(), &ImportOptions::default());

    let divide = report.find_method("CalculatorSoap", "Divide").expect("Divide");
    assert!(divide.wrapped);
    assert_eq!(divide.style, Some(SoapBindingStyle::Rpc));
    assert_eq!(
        divide.plan.base_directions(),
        directions(&[
            ("dividend", ParameterDirection::In),
            ("divisor", ParameterDirection::In),
            ("remainder", ParameterDirection::Out),
        ])
    );
    assert_eq!(
        divide.plan.return_value.as_ref().map(|value| value.name.as_str()),
        Some("DivideResult")
    );
}

#[test]
fn http_get_reflects_only_simple_methods() {
    let contract = contract(CALCULATOR);
    let reflect = ReflectOptions {
        protocols: vec!["Soap".into(), "HttpGet".into()],
    };
    let options = ImportOptions {
        protocol: Some("HttpGet".into()),
        ..ImportOptions::default()
    };
    let (report, emitter) = round_trip(&contract, &reflect, &options);

    assert_eq!(report.classes, ["CalculatorHttpGet"]);
    assert!(report.find_method("CalculatorHttpGet", "Add").is_some());
    // byref, out and one-way methods have no HTTP GET shape
    assert!(report.find_method("CalculatorHttpGet", "Swap").is_none());
    assert!(report.find_method("CalculatorHttpGet", "Fetch").is_none());
    assert!(report.find_method("CalculatorHttpGet", "Ping").is_none());

    let add = emitter.find_method("add").expect("add");
    assert_eq!(add.return_type.as_deref(), Some("i32"));
}

#[test]
fn document_encoded_is_refused() {
    let contract = contract(
        r#"
        name = "Broken"
        namespace = "urn:broken"
        use = "encoded"

        [[methods]]
        name = "Call"
        "#,
    );

    let result = to_wsdl(&contract, &ReflectOptions::default());
    assert!(matches!(
        result,
        Err(Error::Reflect(ReflectError::DocumentEncoded(method))) if method == "Call"
    ));
}

#[test]
fn unknown_parameter_type_is_refused() {
    let contract = contract(
        r#"
        name = "Broken"
        namespace = "urn:broken"

        [[methods]]
        name = "Call"
        parameters = [{ name = "order", type = "Order" }]
        "#,
    );

    let result = to_wsdl(&contract, &ReflectOptions::default());
    assert!(matches!(
        result,
        Err(Error::Reflect(ReflectError::UnknownType { ty, .. })) if ty == "Order"
    ));
}
