use wsbind_conformance::{check, check_claims, RuleCode, Violation};
use wsbind_wsdl::descriptions::Descriptions;

fn descriptions(body: &str) -> Descriptions {
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions targetNamespace="urn:stock"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:wsi="http://ws-i.org/schemas/conformanceClaim/"
    xmlns:ext="urn:vendor"
    xmlns:tns="urn:stock">
  <wsdl:types>
    <s:schema targetNamespace="urn:stock" elementFormDefault="qualified">
      <s:element name="Lookup" type="s:string"/>
      <s:element name="LookupResponse" type="s:string"/>
      <s:element name="Session" type="s:string"/>
    </s:schema>
  </wsdl:types>
  {}
</wsdl:definitions>
"#,
        body
    );

    wsbind_wsdl::parse_str(&xml).expect("parse").into()
}

fn find(violations: &[Violation], rule: RuleCode) -> Option<&Violation> {
    violations.iter().find(|violation| violation.rule == rule)
}

const DOCUMENT_MESSAGES: &str = r#"
  <wsdl:message name="LookupIn"><wsdl:part name="body" element="tns:Lookup"/></wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" element="tns:LookupResponse"/></wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
    <wsdl:operation name="LookupAgain">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
"#;

#[test]
fn conforming_description_has_no_violations() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="LookupIn"><wsdl:part name="body" element="tns:Lookup"/></wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" element="tns:LookupResponse"/></wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <soap:operation soapAction="urn:stock/Lookup"/>
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    assert_eq!(check(&descriptions), Vec::new());
}

#[test]
fn operations_sharing_a_wire_signature_are_both_reported() {
    let descriptions = descriptions(&format!(
        r#"{}
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="LookupAgain">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
        DOCUMENT_MESSAGES
    ));

    let violations = check(&descriptions);
    let collision = find(&violations, RuleCode::R2710).expect("R2710");
    assert_eq!(
        collision.elements,
        [
            "wsdl:binding[@name='StockSoap']/wsdl:operation[@name='Lookup']",
            "wsdl:binding[@name='StockSoap']/wsdl:operation[@name='LookupAgain']",
        ]
    );
    assert_eq!(violations.iter().filter(|violation| violation.rule == RuleCode::R2710).count(), 1);
}

#[test]
fn binding_and_port_type_must_match() {
    let descriptions = descriptions(&format!(
        r#"{}
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="Remove">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
    </wsdl:operation>
  </wsdl:binding>
"#,
        DOCUMENT_MESSAGES
    ));

    let violations = check(&descriptions);
    let mismatch = find(&violations, RuleCode::R2718).expect("R2718");
    assert!(mismatch
        .elements
        .contains(&"wsdl:binding[@name='StockSoap']/wsdl:operation[@name='Remove']".to_owned()));
    assert!(mismatch
        .elements
        .contains(&"wsdl:portType[@name='StockPort']/wsdl:operation[@name='LookupAgain']".to_owned()));
}

#[test]
fn transport_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:portType name="EmptyPort"/>
  <wsdl:binding name="NoTransport" type="tns:EmptyPort">
    <soap:binding style="document"/>
  </wsdl:binding>
  <wsdl:binding name="Smtp" type="tns:EmptyPort">
    <soap:binding transport="http://example.com/smtp" style="document"/>
  </wsdl:binding>
"#,
    );

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2701).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:binding[@name='NoTransport']".to_owned()])
    );
    assert_eq!(
        find(&violations, RuleCode::R2702).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:binding[@name='Smtp']".to_owned()])
    );
}

#[test]
fn rpc_body_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="AddIn"><wsdl:part name="a" element="tns:Lookup"/></wsdl:message>
  <wsdl:message name="AddOut"><wsdl:part name="sum" type="s:int"/></wsdl:message>
  <wsdl:portType name="CalcPort">
    <wsdl:operation name="Add">
      <wsdl:input message="tns:AddIn"/>
      <wsdl:output message="tns:AddOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CalcSoap" type="tns:CalcPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc"/>
    <wsdl:operation name="Add">
      <wsdl:input><soap:body use="encoded" encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"/></wsdl:input>
      <wsdl:output><soap:body use="literal" namespace="urn:calc"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    let violations = check(&descriptions);
    assert!(find(&violations, RuleCode::R2706).is_some());
    assert_eq!(
        find(&violations, RuleCode::R2717).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:binding[@name='CalcSoap']/wsdl:operation[@name='Add']".to_owned()])
    );
    assert_eq!(
        find(&violations, RuleCode::R2203).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:message[@name='AddIn']/wsdl:part[@name='a']".to_owned()])
    );
}

#[test]
fn header_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="LookupIn">
    <wsdl:part name="body" element="tns:Lookup"/>
    <wsdl:part name="token" type="s:string"/>
  </wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" element="tns:LookupResponse"/></wsdl:message>
  <wsdl:message name="SessionHeader"><wsdl:part name="session" element="tns:Session"/></wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input>
        <soap:body use="literal" parts="body"/>
        <soap:header message="tns:LookupIn" part="token" use="literal"/>
      </wsdl:input>
      <wsdl:output>
        <soap:body use="literal"/>
        <soap:header message="tns:SessionHeader" use="literal" namespace="urn:stock"/>
      </wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2205).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:message[@name='LookupIn']/wsdl:part[@name='token']".to_owned()])
    );
    assert!(find(&violations, RuleCode::R2720).is_some());
    assert!(find(&violations, RuleCode::R2716).is_some());
    // the token part is bound through the header
    assert!(find(&violations, RuleCode::R2209).is_none());
}

#[test]
fn document_body_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="LookupIn">
    <wsdl:part name="body" element="tns:Lookup"/>
    <wsdl:part name="extra" type="s:string" element="tns:Session"/>
  </wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" type="s:string"/></wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
    <wsdl:operation name="Ticker">
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="Ticker">
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    let violations = check(&descriptions);
    assert!(find(&violations, RuleCode::R2210).is_some());
    assert_eq!(
        find(&violations, RuleCode::R2306).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:message[@name='LookupIn']/wsdl:part[@name='extra']".to_owned()])
    );
    assert_eq!(
        find(&violations, RuleCode::R2204).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:message[@name='LookupOut']/wsdl:part[@name='body']".to_owned()])
    );
    assert_eq!(
        find(&violations, RuleCode::R2303).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:portType[@name='StockPort']/wsdl:operation[@name='Ticker']".to_owned()])
    );
}

#[test]
fn http_bindings_are_not_checked() {
    let descriptions = descriptions(&format!(
        r#"{}
  <wsdl:binding name="StockHttp" type="tns:StockPort">
    <http:binding verb="GET"/>
  </wsdl:binding>
"#,
        DOCUMENT_MESSAGES
    ));

    assert!(check(&descriptions).is_empty());
}

#[test]
fn required_extension_under_a_claim() {
    let descriptions = descriptions(
        r#"
  <wsdl:portType name="EmptyPort"/>
  <wsdl:binding name="Claimed" type="tns:EmptyPort">
    <wsdl:documentation>
      <wsi:Claim conformsTo="http://ws-i.org/profiles/basic/1.1"/>
    </wsdl:documentation>
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <ext:policy wsdl:required="true"/>
  </wsdl:binding>
  <wsdl:binding name="Unclaimed" type="tns:EmptyPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <ext:policy wsdl:required="true"/>
  </wsdl:binding>
"#,
    );

    let claims = check_claims(&descriptions);
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].rule, RuleCode::R2026);
    assert_eq!(claims[0].elements, ["wsdl:binding[@name='Claimed']/{urn:vendor}policy"]);

    let violations = check(&descriptions);
    assert_eq!(find(&violations, RuleCode::R2026), Some(&claims[0]));
}

#[test]
fn document_body_lists_more_than_one_part() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="LookupIn">
    <wsdl:part name="body" element="tns:Lookup"/>
    <wsdl:part name="extra" element="tns:Session"/>
  </wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" element="tns:LookupResponse"/></wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input><soap:body use="literal" parts="body extra"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2201).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:binding[@name='StockSoap']/wsdl:operation[@name='Lookup']".to_owned()])
    );
    assert!(find(&violations, RuleCode::R2210).is_none());
}

#[test]
fn port_type_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="LookupIn"><wsdl:part name="body" element="tns:Lookup"/></wsdl:message>
  <wsdl:message name="LookupOut"><wsdl:part name="body" element="tns:LookupResponse"/></wsdl:message>
  <wsdl:message name="DivideIn"><wsdl:part name="value" type="s:int"/></wsdl:message>
  <wsdl:message name="DivideOut">
    <wsdl:part name="quotient" type="s:int"/>
    <wsdl:part name="remainder" type="s:int"/>
  </wsdl:message>
  <wsdl:portType name="StockPort">
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
    <wsdl:operation name="Lookup">
      <wsdl:input message="tns:LookupIn"/>
      <wsdl:output message="tns:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:portType name="CalcPort">
    <wsdl:operation name="Divide" parameterOrder="value">
      <wsdl:input message="tns:DivideIn"/>
      <wsdl:output message="tns:DivideOut"/>
    </wsdl:operation>
    <wsdl:operation name="Halve" parameterOrder="value quotient">
      <wsdl:input message="tns:DivideIn"/>
      <wsdl:output message="tns:DivideOut"/>
    </wsdl:operation>
  </wsdl:portType>
"#,
    );

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2304).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:portType[@name='StockPort']".to_owned()])
    );
    // omitting a single output part is allowed
    assert_eq!(
        find(&violations, RuleCode::R2305).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:portType[@name='CalcPort']/wsdl:operation[@name='Divide']".to_owned()])
    );
}

#[test]
fn operations_mixing_styles() {
    let descriptions = descriptions(&format!(
        r#"{}
  <wsdl:binding name="StockSoap" type="tns:StockPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="document"/>
    <wsdl:operation name="Lookup">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="LookupAgain">
      <soap:operation soapAction="urn:stock/LookupAgain" style="rpc"/>
      <wsdl:input><soap:body use="literal" namespace="urn:stock"/></wsdl:input>
      <wsdl:output><soap:body use="literal" namespace="urn:stock"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
"#,
        DOCUMENT_MESSAGES
    ));

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2705).map(|violation| violation.elements.clone()),
        Some(vec!["wsdl:binding[@name='StockSoap']".to_owned()])
    );
}

#[test]
fn rpc_fault_and_header_rules() {
    let descriptions = descriptions(
        r#"
  <wsdl:message name="CalcIn"><wsdl:part name="a" type="s:int"/></wsdl:message>
  <wsdl:message name="CalcOut"><wsdl:part name="result" type="s:int"/></wsdl:message>
  <wsdl:message name="BusyFault"><wsdl:part name="detail" element="tns:Session"/></wsdl:message>
  <wsdl:message name="SessionHeader"><wsdl:part name="session" element="tns:Session"/></wsdl:message>
  <wsdl:portType name="CalcPort">
    <wsdl:operation name="Add">
      <wsdl:input message="tns:CalcIn"/>
      <wsdl:output message="tns:CalcOut"/>
      <wsdl:fault name="Busy" message="tns:BusyFault"/>
    </wsdl:operation>
    <wsdl:operation name="Subtract">
      <wsdl:input message="tns:CalcIn"/>
      <wsdl:output message="tns:CalcOut"/>
      <wsdl:fault name="Busy" message="tns:BusyFault"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CalcSoap" type="tns:CalcPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc"/>
    <wsdl:operation name="Add">
      <wsdl:input>
        <soap:body use="literal" namespace="urn:calc"/>
        <soap:header message="tns:SessionHeader" part="session" use="literal" namespace="urn:calc"/>
      </wsdl:input>
      <wsdl:output><soap:body use="literal" namespace="urn:calc"/></wsdl:output>
      <wsdl:fault name="Busy"><soap:fault use="literal"/></wsdl:fault>
    </wsdl:operation>
    <wsdl:operation name="Subtract">
      <wsdl:input><soap:body use="literal" namespace="urn:calc"/></wsdl:input>
      <wsdl:output><soap:body use="literal" namespace="urn:calc"/></wsdl:output>
      <wsdl:fault name="Busy"><soap:fault name="Overloaded" use="literal"/></wsdl:fault>
    </wsdl:operation>
  </wsdl:binding>
"#,
    );

    let add = "wsdl:binding[@name='CalcSoap']/wsdl:operation[@name='Add']".to_owned();
    let subtract = "wsdl:binding[@name='CalcSoap']/wsdl:operation[@name='Subtract']".to_owned();

    let violations = check(&descriptions);
    assert_eq!(
        find(&violations, RuleCode::R2726).map(|violation| violation.elements.clone()),
        Some(vec![add.clone()])
    );
    assert_eq!(
        find(&violations, RuleCode::R2721).map(|violation| violation.elements.clone()),
        Some(vec![add])
    );
    assert_eq!(
        find(&violations, RuleCode::R2754).map(|violation| violation.elements.clone()),
        Some(vec![subtract])
    );
    assert!(find(&violations, RuleCode::R2716).is_none());
    assert!(find(&violations, RuleCode::R2205).is_none());
}
