use serde::Serialize;
use std::fmt;

/// WS-I Basic Profile 1.1 requirements the checker knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RuleCode {
    R2026,
    R2201,
    R2203,
    R2204,
    R2205,
    R2209,
    R2210,
    R2303,
    R2304,
    R2305,
    R2306,
    R2701,
    R2702,
    R2705,
    R2706,
    R2710,
    R2716,
    R2717,
    R2718,
    R2720,
    R2721,
    R2726,
    R2754,
}

impl RuleCode {
    pub const ALL: [RuleCode; 23] = [
        RuleCode::R2026,
        RuleCode::R2201,
        RuleCode::R2203,
        RuleCode::R2204,
        RuleCode::R2205,
        RuleCode::R2209,
        RuleCode::R2210,
        RuleCode::R2303,
        RuleCode::R2304,
        RuleCode::R2305,
        RuleCode::R2306,
        RuleCode::R2701,
        RuleCode::R2702,
        RuleCode::R2705,
        RuleCode::R2706,
        RuleCode::R2710,
        RuleCode::R2716,
        RuleCode::R2717,
        RuleCode::R2718,
        RuleCode::R2720,
        RuleCode::R2721,
        RuleCode::R2726,
        RuleCode::R2754,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleCode::R2026 => "R2026",
            RuleCode::R2201 => "R2201",
            RuleCode::R2203 => "R2203",
            RuleCode::R2204 => "R2204",
            RuleCode::R2205 => "R2205",
            RuleCode::R2209 => "R2209",
            RuleCode::R2210 => "R2210",
            RuleCode::R2303 => "R2303",
            RuleCode::R2304 => "R2304",
            RuleCode::R2305 => "R2305",
            RuleCode::R2306 => "R2306",
            RuleCode::R2701 => "R2701",
            RuleCode::R2702 => "R2702",
            RuleCode::R2705 => "R2705",
            RuleCode::R2706 => "R2706",
            RuleCode::R2710 => "R2710",
            RuleCode::R2716 => "R2716",
            RuleCode::R2717 => "R2717",
            RuleCode::R2718 => "R2718",
            RuleCode::R2720 => "R2720",
            RuleCode::R2721 => "R2721",
            RuleCode::R2726 => "R2726",
            RuleCode::R2754 => "R2754",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RuleCode::R2026 => "A description should not include extension elements with a wsdl:required attribute value of \"true\" on any construct that claims conformance to the profile.",
            RuleCode::R2201 => "A document-literal binding must, in each of its soapbind:body elements, have at most one part listed in the parts attribute.",
            RuleCode::R2203 => "An rpc-literal binding must refer, in its soapbind:body elements, only to wsdl:part elements that have been defined using the type attribute.",
            RuleCode::R2204 => "A document-literal binding must refer, in each of its soapbind:body elements, only to wsdl:part elements that have been defined using the element attribute.",
            RuleCode::R2205 => "A wsdl:binding must refer, in each of its soapbind:header, soapbind:headerfault and soapbind:fault elements, only to wsdl:part elements that have been defined using the element attribute.",
            RuleCode::R2209 => "A wsdl:binding should bind every wsdl:part of a wsdl:message in the wsdl:portType to which it refers to one of soapbind:body, soapbind:header, soapbind:fault or soapbind:headerfault.",
            RuleCode::R2210 => "If a document-literal binding does not specify the parts attribute on a soapbind:body element, the corresponding abstract wsdl:message must define zero or one wsdl:parts.",
            RuleCode::R2303 => "A description must not use solicit-response and notification type operations in a wsdl:portType definition.",
            RuleCode::R2304 => "Operation name overloading in a wsdl:portType is disallowed.",
            RuleCode::R2305 => "The parameterOrder attribute of a wsdl:operation, if present, must omit at most one wsdl:part from the output message.",
            RuleCode::R2306 => "A wsdl:message must not specify both type and element attributes on the same wsdl:part.",
            RuleCode::R2701 => "The soapbind:binding element of a wsdl:binding must specify the transport attribute.",
            RuleCode::R2702 => "A wsdl:binding must specify the HTTP transport protocol with the SOAP binding.",
            RuleCode::R2705 => "A wsdl:binding must be either an rpc-literal binding or a document-literal binding.",
            RuleCode::R2706 => "A wsdl:binding must use the value \"literal\" for the use attribute in all soapbind:body, soapbind:fault, soapbind:header and soapbind:headerfault elements.",
            RuleCode::R2710 => "The operations in a wsdl:binding must result in operation signatures that are different from one another.",
            RuleCode::R2716 => "A document-literal binding must not have the namespace attribute specified on contained soapbind:body, soapbind:header, soapbind:headerfault and soapbind:fault elements.",
            RuleCode::R2717 => "An rpc-literal binding must have the namespace attribute specified, with an absolute URI value, on contained soapbind:body elements.",
            RuleCode::R2718 => "A wsdl:binding must have the same set of wsdl:operations as the wsdl:portType to which it refers.",
            RuleCode::R2720 => "A wsdl:binding must use the part attribute on all contained soapbind:header and soapbind:headerfault elements.",
            RuleCode::R2721 => "A wsdl:binding must have the name attribute specified on all contained soapbind:fault elements.",
            RuleCode::R2726 => "An rpc-literal binding must not have the namespace attribute specified on contained soapbind:header, soapbind:headerfault and soapbind:fault elements.",
            RuleCode::R2754 => "The name attribute of a soapbind:fault element must match the name attribute of its parent wsdl:fault element.",
        }
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken rule with every element that breaks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: RuleCode,
    pub message: String,
    pub elements: Vec<String>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)?;
        for element in &self.elements {
            write!(f, "\n  - {}", element)?;
        }
        Ok(())
    }
}

/// Violations keyed by rule, in the order rules were first broken.
#[derive(Debug, Default, Clone)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: RuleCode, element: impl Into<String>) {
        let element = element.into();

        match self.0.iter_mut().find(|violation| violation.rule == rule) {
            Some(violation) => {
                if !violation.elements.contains(&element) {
                    violation.elements.push(element);
                }
            }
            None => {
                tracing::debug!(%rule, %element, "conformance rule broken");
                self.0.push(Violation {
                    rule,
                    message: rule.message().to_owned(),
                    elements: vec![element],
                });
            }
        }
    }

    pub fn extend(&mut self, other: Violations) {
        for violation in other.0 {
            for element in violation.elements {
                self.add(violation.rule, element);
            }
        }
    }

    pub fn find(&self, rule: RuleCode) -> Option<&Violation> {
        self.0.iter().find(|violation| violation.rule == rule)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes = RuleCode::ALL.iter().map(|rule| rule.as_str()).collect::<Vec<_>>();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), RuleCode::ALL.len());
    }

    #[test]
    fn one_entry_per_rule() {
        let mut violations = Violations::new();
        violations.add(RuleCode::R2710, "wsdl:binding[@name='A']/wsdl:operation[@name='x']");
        violations.add(RuleCode::R2701, "wsdl:binding[@name='A']");
        violations.add(RuleCode::R2710, "wsdl:binding[@name='A']/wsdl:operation[@name='y']");
        violations.add(RuleCode::R2710, "wsdl:binding[@name='A']/wsdl:operation[@name='x']");

        let violations = violations.into_vec();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].rule, RuleCode::R2710);
        assert_eq!(violations[0].elements.len(), 2);
        assert_eq!(violations[1].rule, RuleCode::R2701);
    }
}
