use crate::wire::{Language, RepairRequest, ServiceType};

fn non_empty(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

/// A street address only counts for pickup; one left over from an earlier
/// pickup choice is not sent.
fn pickup_address(req: &RepairRequest) -> Option<&str> {
    match req.service_type {
        ServiceType::Pickup => req.street_address.as_deref().and_then(non_empty),
        ServiceType::StoreVisit => None,
    }
}

fn prompt_en(req: &RepairRequest) -> String {
    let software = req
        .software_issue
        .as_deref()
        .and_then(non_empty)
        .map(|s| format!("- Software Issue Detail: {s}\n"))
        .unwrap_or_default();
    let description = non_empty(&req.issue_description).unwrap_or("None");
    let address = pickup_address(req).unwrap_or("Not specified (Customer will visit the store)");
    let service = match req.service_type {
        ServiceType::Pickup => "Pickup and delivery from customer location",
        ServiceType::StoreVisit => "Customer will bring the device to the store",
    };

    format!(
r#"You are an expert mobile phone repair technician working at a service center in Riyadh, Saudi Arabia.
Your task is to analyze the problem and provide a preliminary technical diagnosis based on the following details.

**Important Diagnostic Instructions:**
1. **Be Precise:** Provide a technical analysis of the problem based on the customer's description.
2. **Identify Potential Causes:** Mention the likely causes of the issue.
3. **Do Not Mention Prices:** Do not include any costs, prices, or currencies in your response whatsoever. Focus only on the technical aspect.
4. **Focus on the Solution:** Provide clear notes about potential repair steps and the required parts.

**Request Details:**
- Manufacturer: {manufacturer}
- Model: {model}
- Main Issue: {issue}
{software}- Additional Description from Customer: {description}
- Customer Location: Riyadh, {address}
- Requested Service Type: {service}

Return the result in JSON format only, complying with the specified schema."#,
        manufacturer = req.manufacturer.trim(),
        model = req.model.trim(),
        issue = req.issue,
    )
}

fn prompt_ar(req: &RepairRequest) -> String {
    let software = req
        .software_issue
        .as_deref()
        .and_then(non_empty)
        .map(|s| format!("- تفصيل مشكلة السوفتوير: {s}\n"))
        .unwrap_or_default();
    let description = non_empty(&req.issue_description).unwrap_or("لا يوجد");
    let address = pickup_address(req).unwrap_or("غير محدد (سيحضر العميل للمحل)");
    let service = match req.service_type {
        ServiceType::Pickup => "استلام وتوصيل من موقع العميل",
        ServiceType::StoreVisit => "العميل سيحضر الجهاز للمحل",
    };

    format!(
r#"أنت خبير فني متخصص في صيانة الهواتف المحمولة وتعمل في مركز خدمة في مدينة الرياض، المملكة العربية السعودية.
مهمتك هي تحليل المشكلة وتقديم تشخيص فني مبدئي بناءً على التفاصيل التالية.

**تعليمات هامة للتشخيص:**
1. **كن دقيقاً:** قدم تحليلاً فنياً للمشكلة بناءً على وصف العميل.
2. **حدد الأسباب المحتملة:** اذكر الأسباب المحتملة للعطل.
3. **لا تذكر أي أسعار:** لا تقم بتضمين أي تكاليف أو أسعار أو عملات في ردك على الإطلاق. ركز فقط على الجانب الفني.
4. **التركيز على الحل:** قدم ملاحظات واضحة حول خطوات الإصلاح المحتملة وقطع الغيار المطلوبة.

**تفاصيل الطلب:**
- الشركة المصنعة: {manufacturer}
- الموديل: {model}
- المشكلة الرئيسية: {issue}
{software}- وصف إضافي من العميل: {description}
- موقع العميل: الرياض، {address}
- نوع الخدمة المطلوبة: {service}

قم بإرجاع النتيجة بصيغة JSON فقط، متوافقة مع المخطط (schema) المحدد."#,
        manufacturer = req.manufacturer.trim(),
        model = req.model.trim(),
        issue = req.issue,
    )
}

/// Diagnosis prompt for `req`, written in `language`.
pub fn diagnosis_prompt(req: &RepairRequest, language: Language) -> String {
    match language {
        Language::Ar => prompt_ar(req),
        Language::En => prompt_en(req),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RepairRequest {
        RepairRequest {
            manufacturer: "Apple".into(),
            model: "iPhone 13".into(),
            issue: "Liquid damage".into(),
            name: "Ahmed Ali".into(),
            phone: "0555555555".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_english_prompt_placeholders() {
        let p = diagnosis_prompt(&sample(), Language::En);
        assert!(p.contains("- Manufacturer: Apple"));
        assert!(p.contains("- Model: iPhone 13"));
        assert!(p.contains("- Main Issue: Liquid damage"));
        assert!(p.contains("Additional Description from Customer: None"));
        assert!(p.contains("Riyadh, Not specified (Customer will visit the store)"));
        assert!(p.contains("Customer will bring the device to the store"));
        assert!(!p.contains("Software Issue Detail"));
        assert!(!p.contains("Pickup and delivery"));
        assert!(p.contains("Do not include any costs, prices, or currencies"));
    }

    #[test]
    fn test_english_prompt_with_optional_fields() {
        let mut req = sample();
        req.issue = "Software issue".into();
        req.software_issue = Some("Device restarts randomly".into());
        req.issue_description = "Happens when charging".into();
        req.service_type = ServiceType::Pickup;
        req.street_address = Some("Al Malqa, Street 12".into());
        let p = diagnosis_prompt(&req, Language::En);
        assert!(p.contains("- Software Issue Detail: Device restarts randomly\n- Additional"));
        assert!(p.contains("Additional Description from Customer: Happens when charging"));
        assert!(p.contains("Customer Location: Riyadh, Al Malqa, Street 12"));
        assert!(p.contains("Pickup and delivery from customer location"));
    }

    #[test]
    fn test_store_visit_ignores_leftover_address() {
        let mut req = sample();
        req.street_address = Some("Olaya St 5".into());
        let en = diagnosis_prompt(&req, Language::En);
        assert!(en.contains("Riyadh, Not specified (Customer will visit the store)"));
        assert!(!en.contains("Olaya St 5"));
        let ar = diagnosis_prompt(&req, Language::Ar);
        assert!(ar.contains("الرياض، غير محدد (سيحضر العميل للمحل)"));
        assert!(!ar.contains("Olaya St 5"));
    }

    #[test]
    fn test_arabic_prompt() {
        let p = diagnosis_prompt(&sample(), Language::Ar);
        assert!(p.contains("الشركة المصنعة: Apple"));
        assert!(p.contains("وصف إضافي من العميل: لا يوجد"));
        assert!(p.contains("غير محدد (سيحضر العميل للمحل)"));
        assert!(p.contains("العميل سيحضر الجهاز للمحل"));
        assert!(!p.contains("Manufacturer"));
    }
}
