use wsbind_codegen::{
    diagnostics::Warnings,
    emitter::{Metadata, RecordingEmitter},
    error::ImportError,
    headers::HeaderDirection,
    import::{import, ImportReport},
    mapping::SchemaTypeMapper,
    options::ImportOptions,
    parameters::ParameterDirection,
};
use wsbind_wsdl::{descriptions::Descriptions, extensions::SoapBindingStyle};

const QUOTE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<definitions targetNamespace="urn:quote"
    xmlns="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:quote"
    xmlns:ext="urn:vendor">
  <types>
    <s:schema targetNamespace="urn:quote" elementFormDefault="qualified">
      <s:element name="GetQuote">
        <s:complexType>
          <s:sequence>
            <s:element name="symbol" type="s:string"/>
            <s:element name="limit" type="s:int" minOccurs="0"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetQuoteResponse">
        <s:complexType>
          <s:sequence>
            <s:element name="GetQuoteResult" type="s:decimal"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetHistory">
        <s:complexType>
          <s:sequence>
            <s:element name="symbol" type="s:string"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetHistoryResponse">
        <s:complexType>
          <s:sequence>
            <s:element name="GetHistoryResult" type="s:string" maxOccurs="unbounded"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="Session" type="s:string"/>
    </s:schema>
  </types>
  <message name="GetQuoteIn"><part name="parameters" element="tns:GetQuote"/></message>
  <message name="GetQuoteOut"><part name="parameters" element="tns:GetQuoteResponse"/></message>
  <message name="GetHistoryIn"><part name="parameters" element="tns:GetHistory"/></message>
  <message name="GetHistoryOut"><part name="parameters" element="tns:GetHistoryResponse"/></message>
  <message name="SessionHeader"><part name="session" element="tns:Session"/></message>
  <portType name="QuotePort">
    <operation name="GetQuote">
      <input message="tns:GetQuoteIn"/>
      <output message="tns:GetQuoteOut"/>
    </operation>
    <operation name="GetHistory">
      <input message="tns:GetHistoryIn"/>
      <output message="tns:GetHistoryOut"/>
    </operation>
  </portType>
  <binding name="QuoteSoap" type="tns:QuotePort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <ext:policy wsdl:required="true" xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"/>
    <operation name="GetQuote">
      <soap:operation soapAction="urn:quote/GetQuote"/>
      <input>
        <soap:body use="literal"/>
        <soap:header message="tns:SessionHeader" part="session" use="literal"/>
      </input>
      <output><soap:body use="literal"/></output>
    </operation>
    <operation name="GetHistory">
      <soap:operation soapAction="urn:quote/GetHistory"/>
      <input><soap:body use="literal"/></input>
      <output>
        <soap:body use="literal"/>
        <soap:header message="tns:SessionHeader" part="session" use="literal"/>
      </output>
    </operation>
  </binding>
  <service name="QuoteService">
    <port name="QuoteSoap" binding="tns:QuoteSoap">
      <soap:address location="http://example.com/quote"/>
    </port>
  </service>
</definitions>
"#;

const CALCULATOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<definitions targetNamespace="urn:calc"
    xmlns="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:calc">
  <message name="AddIn">
    <part name="x" type="s:int"/>
    <part name="a" type="s:int"/>
  </message>
  <message name="AddOut">
    <part name="b" type="s:int"/>
    <part name="sum" type="s:int"/>
  </message>
  <message name="ClearIn">
    <part name="memory" type="s:int"/>
  </message>
  <message name="ResetIn"/>
  <message name="TickOut">
    <part name="value" type="s:int"/>
  </message>
  <portType name="CalcPort">
    <operation name="Add" parameterOrder="a b">
      <input message="tns:AddIn"/>
      <output message="tns:AddOut"/>
    </operation>
    <operation name="Clear">
      <input message="tns:ClearIn"/>
      <output message="tns:AddOut"/>
    </operation>
    <operation name="Reset">
      <input message="tns:ResetIn"/>
    </operation>
    <operation name="Tick">
      <output message="tns:TickOut"/>
    </operation>
  </portType>
  <binding name="CalcSoap" type="tns:CalcPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc"/>
    <operation name="Add">
      <soap:operation soapAction="urn:calc/Add"/>
      <input><soap:body use="encoded" namespace="urn:calc" encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"/></input>
      <output><soap:body use="encoded" namespace="urn:calc" encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"/></output>
    </operation>
    <operation name="Clear">
      <soap:operation soapAction="urn:calc/Clear"/>
      <input><soap:body use="encoded" namespace="urn:calc"/></input>
      <output><soap:body use="encoded" namespace="urn:calc"/></output>
    </operation>
    <operation name="Reset">
      <soap:operation soapAction="urn:calc/Reset"/>
      <input><soap:body use="literal" namespace="urn:calc"/></input>
    </operation>
    <operation name="Tick">
      <soap:operation soapAction="urn:calc/Tick"/>
      <output><soap:body use="literal" namespace="urn:calc"/></output>
    </operation>
  </binding>
  <binding name="BrokenSoap" type="tns:CalcPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc"/>
    <operation name="Multiply">
      <input><soap:body use="literal" namespace="urn:calc"/></input>
    </operation>
  </binding>
  <binding name="CalcSmtp" type="tns:CalcPort">
    <soap:binding transport="http://example.com/smtp" style="rpc"/>
  </binding>
  <binding name="CalcHttpGet" type="tns:CalcPort">
    <http:binding verb="GET" xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"/>
    <operation name="Add">
      <http:operation location="/Add" xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"/>
      <input><http:urlEncoded xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"/></input>
      <output><mime:mimeXml part="sum" xmlns:mime="http://schemas.xmlsoap.org/wsdl/mime/"/></output>
    </operation>
  </binding>
  <service name="Calculator">
    <port name="CalcSoap" binding="tns:CalcSoap">
      <soap:address location="http://example.com/calc"/>
    </port>
    <port name="BrokenSoap" binding="tns:BrokenSoap">
      <soap:address location="http://example.com/broken"/>
    </port>
    <port name="CalcSmtp" binding="tns:CalcSmtp">
      <soap:address location="mailto:calc@example.com"/>
    </port>
    <port name="CalcHttpGet" binding="tns:CalcHttpGet">
      <http:address location="http://example.com/calc" xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"/>
    </port>
  </service>
</definitions>
"#;

fn descriptions(xml: &str) -> Descriptions {
    wsbind_wsdl::parse_str(xml).expect("parse").into()
}

fn run(descriptions: &Descriptions, options: &ImportOptions) -> (ImportReport, RecordingEmitter) {
    let mapper = SchemaTypeMapper::new(descriptions);
    let mut emitter = RecordingEmitter::new();
    let report = import(descriptions, &mapper, options, &mut emitter).expect("import");
    (report, emitter)
}

#[test]
fn document_literal_wrapped_operations() {
    let descriptions = descriptions(QUOTE);
    let (report, emitter) = run(&descriptions, &ImportOptions::default());

    assert_eq!(report.classes, ["QuoteSoap"]);

    let quote = report.find_method("QuoteSoap", "GetQuote").expect("GetQuote");
    assert!(quote.wrapped);
    assert_eq!(quote.style, Some(SoapBindingStyle::Document));
    assert_eq!(quote.plan.names(), ["symbol", "limit", "limit_specified"]);
    assert_eq!(quote.plan.types(), ["String", "i32", "bool"]);
    assert_eq!(
        quote.plan.return_value.as_ref().map(|value| value.name.as_str()),
        Some("GetQuoteResult")
    );

    let method = emitter.find_method("get_quote").expect("get_quote");
    assert_eq!(method.return_type.as_deref(), Some("f64"));
    assert!(method.metadata.iter().any(|metadata| matches!(
        metadata,
        Metadata::SoapMethod(info) if info.action.as_deref() == Some("urn:quote/GetQuote") && info.wrapped
    )));

    let history = emitter.find_method("get_history").expect("get_history");
    assert_eq!(history.return_type.as_deref(), Some("Vec<String>"));
}

#[test]
fn shared_header_becomes_one_field() {
    let descriptions = descriptions(QUOTE);
    let (report, emitter) = run(&descriptions, &ImportOptions::default());

    let fields = emitter.fields().collect::<Vec<_>>();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "session");
    assert_eq!(fields[0].ty, "Option<String>");

    let quote = report.find_method("QuoteSoap", "GetQuote").expect("GetQuote");
    let history = report.find_method("QuoteSoap", "GetHistory").expect("GetHistory");
    assert_eq!(quote.headers.len(), 1);
    assert_eq!(quote.headers[0].direction, HeaderDirection::IN);
    assert_eq!(history.headers[0].direction, HeaderDirection::OUT);
    assert_eq!(quote.headers[0].key, history.headers[0].key);
}

#[test]
fn skipped_operation_does_not_claim_a_header_field() {
    let xml = QUOTE.replacen(
        r#"<soap:header message="tns:SessionHeader" part="session" use="literal"/>
      </input>"#,
        r#"<soap:header message="tns:SessionHeader" part="session" use="literal"/>
        <soap:header message="tns:Ghost" part="g" use="literal"/>
      </input>"#,
        1,
    );
    let descriptions = descriptions(&xml);
    let (report, emitter) = run(&descriptions, &ImportOptions::default());

    assert!(report.find_method("QuoteSoap", "GetQuote").is_none());

    let history = report.find_method("QuoteSoap", "GetHistory").expect("GetHistory");
    let fields = emitter.fields().collect::<Vec<_>>();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, history.headers[0].field);
    assert_eq!(history.headers[0].direction, HeaderDirection::OUT);
}

#[test]
fn ignored_required_extension_is_reported() {
    let descriptions = descriptions(QUOTE);
    let (report, emitter) = run(&descriptions, &ImportOptions::default());

    assert!(report.warnings.contains(Warnings::REQUIRED_EXTENSIONS_IGNORED));
    assert!(!report.warnings.contains(Warnings::OPTIONAL_EXTENSIONS_IGNORED));
    assert!(emitter
        .comments()
        .any(|comment| comment.contains("required extension 'urn:vendor:policy'")));
}

#[test]
fn rpc_parameter_order_and_unsupported_operations() {
    let descriptions = descriptions(CALCULATOR);
    let options = ImportOptions {
        protocol: Some("soap".into()),
        ..ImportOptions::default()
    };
    let (report, emitter) = run(&descriptions, &options);

    let add = report.find_method("CalcSoap", "Add").expect("Add");
    assert_eq!(add.style, Some(SoapBindingStyle::Rpc));
    assert_eq!(add.plan.names(), ["a", "b", "x"]);
    assert_eq!(
        add.plan.directions(),
        [
            ParameterDirection::In,
            ParameterDirection::Out,
            ParameterDirection::In
        ]
    );
    assert_eq!(
        add.plan.return_value.as_ref().map(|value| value.name.as_str()),
        Some("sum")
    );

    // encoded without a SOAP encodingStyle
    assert!(report.find_method("CalcSoap", "Clear").is_none());
    // notification flow
    assert!(report.find_method("CalcSoap", "Tick").is_none());

    let reset = emitter.find_method("reset").expect("one-way reset");
    assert!(reset.return_type.is_none());
    assert!(reset.metadata.iter().any(|metadata| matches!(
        metadata,
        Metadata::SoapMethod(info) if info.one_way
    )));

    assert!(report.warnings.contains(Warnings::UNSUPPORTED_OPERATIONS_IGNORED));
}

#[test]
fn broken_binding_does_not_stop_the_run() {
    let descriptions = descriptions(CALCULATOR);
    let (report, emitter) = run(&descriptions, &ImportOptions::default());

    assert_eq!(report.classes, ["CalcSoap", "CalcHttpGet"]);
    assert!(report.warnings.contains(Warnings::UNSUPPORTED_BINDINGS_IGNORED));
    assert!(report
        .messages
        .iter()
        .any(|warning| warning.message.starts_with("unable to import binding 'BrokenSoap'")));
    assert!(report
        .messages
        .iter()
        .any(|warning| warning.message.contains("'CalcSmtp' is not supported")));

    // nothing from the failed binding leaks into the output
    assert_eq!(emitter.classes().count(), 2);
    assert!(!report.warnings.contains(Warnings::NO_CODE_GENERATED));
}

#[test]
fn http_get_binding() {
    let descriptions = descriptions(CALCULATOR);
    let options = ImportOptions {
        protocol: Some("HttpGet".into()),
        ..ImportOptions::default()
    };
    let (report, emitter) = run(&descriptions, &options);

    assert_eq!(report.classes, ["CalcHttpGet"]);

    let add = report.find_method("CalcHttpGet", "Add").expect("Add");
    assert_eq!(add.plan.names(), ["x", "a"]);
    assert!(add.style.is_none());

    let method = emitter.find_method("add").expect("add");
    assert_eq!(method.return_type.as_deref(), Some("i32"));
    assert!(method.metadata.iter().any(|metadata| matches!(
        metadata,
        Metadata::HttpMethod(info) if info.verb == "GET" && info.input == "urlEncoded"
    )));
}

#[test]
fn unknown_protocol_fails_fast() {
    let descriptions = descriptions(QUOTE);
    let mapper = SchemaTypeMapper::new(&descriptions);
    let options = ImportOptions {
        protocol: Some("Corba".into()),
        ..ImportOptions::default()
    };

    let result = import(&descriptions, &mapper, &options, &mut RecordingEmitter::new());
    assert!(matches!(result, Err(ImportError::UnknownProtocol(name)) if name == "Corba"));
}

#[test]
fn nothing_usable_generates_no_code() {
    let descriptions = descriptions(CALCULATOR);
    let options = ImportOptions {
        protocol: Some("HttpPost".into()),
        ..ImportOptions::default()
    };
    let (report, emitter) = run(&descriptions, &options);

    assert!(report.classes.is_empty());
    assert!(report.warnings.contains(Warnings::NO_CODE_GENERATED));
    assert_eq!(emitter.classes().count(), 0);
}

#[test]
fn async_methods_get_a_delegate_and_an_event() {
    let descriptions = descriptions(QUOTE);
    let options = ImportOptions {
        generate_async: true,
        ..ImportOptions::default()
    };
    let (_, emitter) = run(&descriptions, &options);

    let events = emitter
        .events()
        .iter()
        .filter_map(|event| match event {
            wsbind_codegen::emitter::EmitterEvent::Event(event) => Some(event),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name, "get_quote_completed");
    assert_eq!(events[0].delegate, "GetQuoteCompletedHandler");
}

#[test]
fn reserved_names_shift_class_names() {
    let descriptions = descriptions(QUOTE);
    let options = ImportOptions {
        reserved_names: vec!["QuoteSoap".into()],
        ..ImportOptions::default()
    };
    let (report, _) = run(&descriptions, &options);

    assert_eq!(report.classes, ["QuoteSoap1"]);
}
